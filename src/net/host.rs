//! 主机（PC）
//!
//! 终端站点：单网口、默认网关、ARP 表与 ICMP 回显服务。主机
//! 不转发：目的地址非本机的报文直接忽略。ping 的发送失败
//! （无线缆/链路断开/无网关）同步返回显式可达性失败。

use super::arp::ArpTable;
use super::device::{Device, DeviceCore, DeviceKind};
use super::frame::{EtherType, EthernetFrame};
use super::id::{DeviceId, PortRef};
use super::ipv4::{Ipv4Packet, PROTO_ICMP};
use super::network::{Network, TxResult};
use super::router::DropReason;
use crate::addr::{IpAddress, MacAddress, SubnetMask};
use crate::icmp::{IcmpMessage, IcmpService};
use crate::sim::Simulator;
use std::any::Any;
use tracing::{debug, info, trace};

/// ping 发起结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PingLaunch {
    Sent { seq: u16 },
    Failed(DropReason),
}

/// 主机节点
pub struct Host {
    core: DeviceCore,
    gateway: Option<IpAddress>,
    arp: ArpTable,
    icmp: IcmpService,
}

impl Host {
    pub fn new(id: DeviceId, name: impl Into<String>, mac: MacAddress) -> Host {
        Host {
            core: DeviceCore::new(id, name, vec![super::cable::Port::new("eth0", mac)]),
            gateway: None,
            arp: ArpTable::new(),
            icmp: IcmpService::new(),
        }
    }

    pub fn configure_interface(&mut self, ip: IpAddress, mask: SubnetMask) {
        info!(host = %self.core.name, %ip, %mask, "接口地址配置");
        self.core.ports[0].set_ip(ip, mask);
    }

    pub fn set_default_gateway(&mut self, gateway: IpAddress) {
        self.gateway = Some(gateway);
    }

    pub fn gateway(&self) -> Option<IpAddress> {
        self.gateway
    }

    pub fn add_arp_entry(&mut self, ip: IpAddress, mac: MacAddress) {
        self.arp.add(ip, mac);
    }

    pub fn arp(&self) -> &ArpTable {
        &self.arp
    }

    pub fn ip(&self) -> Option<(IpAddress, SubnetMask)> {
        self.core.ports[0].ip
    }

    pub fn mac(&self) -> MacAddress {
        self.core.ports[0].mac
    }

    pub fn icmp(&self) -> &IcmpService {
        &self.icmp
    }

    pub fn icmp_mut(&mut self) -> &mut IcmpService {
        &mut self.icmp
    }

    /// 目的在本子网则直接送达，否则走默认网关。
    fn resolve_next_hop(&self, dst: &IpAddress) -> Result<IpAddress, DropReason> {
        let (my_ip, mask) = self.core.ports[0].ip.ok_or(DropReason::NoRoute)?;
        if dst.same_subnet(&my_ip, &mask) {
            Ok(*dst)
        } else {
            self.gateway.ok_or(DropReason::NoRoute)
        }
    }

    fn send_ipv4(
        &mut self,
        pkt: &Ipv4Packet,
        sim: &mut Simulator,
        net: &mut Network,
    ) -> Result<(), DropReason> {
        let next_hop = self.resolve_next_hop(&pkt.dst)?;
        let dst_mac = self.arp.lookup(&next_hop).ok_or(DropReason::NoArpEntry)?;
        let port = &self.core.ports[0];
        if !port.admin_up {
            return Err(DropReason::LinkDown);
        }
        let frame = EthernetFrame::new(port.mac, dst_mac, EtherType::Ipv4, pkt.to_bytes());
        let from = PortRef {
            device: self.core.id,
            port: 0,
        };
        match net.transmit_on(port.cable, from, frame, sim) {
            TxResult::Sent => Ok(()),
            TxResult::PowerOff => Err(DropReason::PowerOff),
            TxResult::NoCable | TxResult::LinkDown => Err(DropReason::LinkDown),
        }
    }

    /// 发起一次 ping。发送失败立即撤销挂起请求并计为丢失。
    #[tracing::instrument(skip(self, sim, net, dst), fields(host = %self.core.name, dst = %dst))]
    pub fn ping(
        &mut self,
        dst: IpAddress,
        ttl: u8,
        sim: &mut Simulator,
        net: &mut Network,
    ) -> PingLaunch {
        if !self.core.powered {
            return PingLaunch::Failed(DropReason::PowerOff);
        }
        let Some((src_ip, _)) = self.core.ports[0].ip else {
            return PingLaunch::Failed(DropReason::NoRoute);
        };
        let handle = self.icmp.create_echo_request(dst, sim.now());
        let msg = IcmpMessage::EchoRequest {
            ident: handle.ident,
            seq: handle.seq,
        };
        let pkt = Ipv4Packet::new(src_ip, dst, PROTO_ICMP, ttl, msg.to_bytes());
        match self.send_ipv4(&pkt, sim, net) {
            Ok(()) => {
                debug!(seq = handle.seq, "回显请求已发出");
                PingLaunch::Sent { seq: handle.seq }
            }
            Err(reason) => {
                info!(reason = %reason, "ping 发送失败");
                self.icmp.fail_pending(dst, handle.seq);
                PingLaunch::Failed(reason)
            }
        }
    }

    fn on_ipv4(&mut self, pkt: Ipv4Packet, sim: &mut Simulator, net: &mut Network) {
        let Some((my_ip, _)) = self.core.ports[0].ip else {
            return;
        };
        if pkt.dst != my_ip {
            trace!(host = %self.core.name, dst = %pkt.dst, "非本机报文，主机不转发");
            return;
        }
        if pkt.protocol != PROTO_ICMP {
            trace!(protocol = pkt.protocol, "主机忽略该协议");
            return;
        }
        match IcmpMessage::from_bytes(&pkt.payload) {
            Ok(IcmpMessage::EchoRequest { ident, seq }) => {
                debug!(host = %self.core.name, from = %pkt.src, seq, "收到回显请求，应答");
                let reply = Ipv4Packet::new(
                    my_ip,
                    pkt.src,
                    PROTO_ICMP,
                    64,
                    IcmpMessage::EchoReply { ident, seq }.to_bytes(),
                );
                if let Err(reason) = self.send_ipv4(&reply, sim, net) {
                    trace!(reason = %reason, "回显应答发送失败");
                }
            }
            Ok(IcmpMessage::EchoReply { ident, seq }) => {
                if let Some(ev) = self.icmp.handle_echo_reply(pkt.src, ident, seq, sim.now()) {
                    info!(host = %self.core.name, peer = %ev.peer, seq = ev.seq, rtt_ns = ev.rtt.0, "ping 应答");
                }
            }
            Err(e) => trace!(error = %e, "ICMP 解析失败"),
        }
    }
}

impl Device for Host {
    fn core(&self) -> &DeviceCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut DeviceCore {
        &mut self.core
    }

    fn kind(&self) -> DeviceKind {
        DeviceKind::Pc
    }

    #[tracing::instrument(skip(self, _port, frame, sim, net), fields(host = %self.core.name))]
    fn on_frame(
        &mut self,
        _port: usize,
        frame: EthernetFrame,
        sim: &mut Simulator,
        net: &mut Network,
    ) {
        match frame.ethertype {
            EtherType::Ipv4 => match Ipv4Packet::from_bytes(&frame.payload) {
                Ok(pkt) => self.on_ipv4(pkt, sim, net),
                Err(e) => trace!(error = %e, "IPv4 解析失败，帧丢弃"),
            },
            other => trace!(ethertype = ?other, "主机忽略该帧"),
        }
    }

    fn on_tick(&mut self, sim: &mut Simulator, _net: &mut Network) {
        let removed = self.icmp.cleanup_timed_out(sim.now());
        if removed > 0 {
            debug!(host = %self.core.name, removed, "清理超时回显请求");
        }
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
