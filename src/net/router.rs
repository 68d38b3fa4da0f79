//! 路由器
//!
//! 转发引擎：TTL 处理、最长前缀匹配、ARP 解析与重新封装，
//! 统计计数器与丢弃/转发观察者（每设备自持监听列表，无全局
//! 事件总线）。可选挂载一个 OSPF 进程，进程发出的报文经内部
//! 发件箱封装为 IPv4 后从对应接口发出。

use super::arp::ArpTable;
use super::device::{Device, DeviceCore, DeviceKind};
use super::frame::{EtherType, EthernetFrame};
use super::id::{DeviceId, PortRef};
use super::ipv4::{Ipv4Packet, PROTO_ICMP, PROTO_OSPF};
use super::network::{Network, TxResult};
use crate::addr::{IpAddress, MacAddress, SubnetMask};
use crate::icmp::IcmpMessage;
use crate::ospf::{
    OspfDest, OspfPacket, OspfProcess, OspfVersion, RouterId, ALL_SPF_ROUTERS_V4,
};
use crate::route::{Route, RouteKind, RoutingTable};
use crate::sim::Simulator;
use std::any::Any;
use std::fmt;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{debug, info, trace, warn};

/// AllSPFRouters 对应的组播 MAC。
const OSPF_MCAST_MAC: MacAddress = MacAddress::new([0x01, 0x00, 0x5E, 0x00, 0x00, 0x05]);

/// 丢弃原因。转发失败是正常的网络结果，以事件与计数呈现，
/// 绝不作为异常抛出。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    TtlExpired,
    NoRoute,
    NoArpEntry,
    LinkDown,
    PowerOff,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DropReason::TtlExpired => "TTL expired",
            DropReason::NoRoute => "no route to host",
            DropReason::NoArpEntry => "no ARP entry",
            DropReason::LinkDown => "link down",
            DropReason::PowerOff => "powered off",
        };
        f.write_str(s)
    }
}

/// 设备配置错误。
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeviceError {
    #[error("unknown interface: {0}")]
    UnknownInterface(String),
    #[error("next hop {0} is not on any connected network")]
    NextHopUnreachable(IpAddress),
}

/// 丢弃事件（交给观察者）。
#[derive(Debug, Clone, Copy)]
pub struct DropEvent {
    pub reason: DropReason,
    pub src: IpAddress,
    pub dst: IpAddress,
}

/// 转发事件（交给观察者）。
#[derive(Debug, Clone)]
pub struct ForwardEvent {
    pub interface: String,
    pub next_hop: IpAddress,
    pub dst: IpAddress,
    /// 转发出去时的 TTL（已递减）。
    pub ttl: u8,
}

/// 转发统计：单调递增，恒有 received = forwarded + dropped。
#[derive(Debug, Default, Clone, Copy)]
pub struct ForwardStats {
    pub packets_received: u64,
    pub packets_forwarded: u64,
    pub packets_dropped: u64,
    pub ttl_expired: u64,
}

struct OspfOutboxEntry {
    iface: String,
    packet: OspfPacket,
    dest: OspfDest,
}

type OspfOutbox = Arc<Mutex<Vec<OspfOutboxEntry>>>;

/// 路由器节点
pub struct Router {
    core: DeviceCore,
    table: RoutingTable,
    arp: ArpTable,
    stats: ForwardStats,
    drop_cbs: Vec<Box<dyn FnMut(&DropEvent) + Send>>,
    forward_cbs: Vec<Box<dyn FnMut(&ForwardEvent) + Send>>,
    ospf: Option<OspfProcess>,
    ospf_outbox: Option<OspfOutbox>,
}

impl Router {
    pub fn new(
        id: DeviceId,
        name: impl Into<String>,
        port_macs: Vec<(String, MacAddress)>,
    ) -> Router {
        let ports = port_macs
            .into_iter()
            .map(|(n, mac)| super::cable::Port::new(n, mac))
            .collect();
        Router {
            core: DeviceCore::new(id, name, ports),
            table: RoutingTable::new(),
            arp: ArpTable::new(),
            stats: ForwardStats::default(),
            drop_cbs: Vec::new(),
            forward_cbs: Vec::new(),
            ospf: None,
            ospf_outbox: None,
        }
    }

    // ---- 配置 ----

    /// 配置接口地址；直连路由随之安装。
    pub fn configure_interface(
        &mut self,
        iface: &str,
        ip: IpAddress,
        mask: SubnetMask,
    ) -> Result<(), DeviceError> {
        let idx = self
            .port_index(iface)
            .ok_or_else(|| DeviceError::UnknownInterface(iface.to_string()))?;
        self.core.ports[idx].set_ip(ip, mask);
        self.table.add_connected(iface, ip, mask);
        info!(router = %self.core.name, iface, %ip, %mask, "接口地址配置");
        Ok(())
    }

    /// 清除接口地址；直连路由随之移除。
    pub fn clear_interface(&mut self, iface: &str) -> Result<(), DeviceError> {
        let idx = self
            .port_index(iface)
            .ok_or_else(|| DeviceError::UnknownInterface(iface.to_string()))?;
        self.core.ports[idx].clear_ip();
        self.table.remove_connected(iface);
        Ok(())
    }

    pub fn add_arp_entry(&mut self, ip: IpAddress, mac: MacAddress) {
        self.arp.add(ip, mac);
    }

    pub fn arp(&self) -> &ArpTable {
        &self.arp
    }

    /// 添加静态路由；出接口按下一跳所在直连网络推导。
    pub fn add_static_route(
        &mut self,
        network: IpAddress,
        mask: SubnetMask,
        next_hop: IpAddress,
        metric: u32,
    ) -> Result<(), DeviceError> {
        let iface = self
            .egress_for(&next_hop)
            .ok_or(DeviceError::NextHopUnreachable(next_hop))?;
        self.table.add_static(network, mask, next_hop, &iface, metric);
        Ok(())
    }

    /// 设置默认路由（0.0.0.0/0）。
    pub fn set_default_route(&mut self, next_hop: IpAddress) -> Result<(), DeviceError> {
        let iface = self
            .egress_for(&next_hop)
            .ok_or(DeviceError::NextHopUnreachable(next_hop))?;
        self.table.set_default(next_hop, &iface);
        Ok(())
    }

    pub fn routes(&self) -> &[Route] {
        self.table.routes()
    }

    pub fn lookup_route(&self, ip: &IpAddress) -> Option<&Route> {
        self.table.lookup(ip)
    }

    pub fn routing_table_mut(&mut self) -> &mut RoutingTable {
        &mut self.table
    }

    pub fn stats(&self) -> &ForwardStats {
        &self.stats
    }

    pub fn on_drop(&mut self, cb: Box<dyn FnMut(&DropEvent) + Send>) {
        self.drop_cbs.push(cb);
    }

    pub fn on_forward(&mut self, cb: Box<dyn FnMut(&ForwardEvent) + Send>) {
        self.forward_cbs.push(cb);
    }

    pub fn interface_ip(&self, iface: &str) -> Option<(IpAddress, SubnetMask)> {
        let idx = self.port_index(iface)?;
        self.core.ports[idx].ip
    }

    /// 目的地址是否为本机接口地址。
    pub fn is_local_ip(&self, ip: &IpAddress) -> bool {
        self.core
            .ports
            .iter()
            .any(|p| p.ip.map(|(addr, _)| addr == *ip).unwrap_or(false))
    }

    /// 下一跳所在直连网络的出接口名。
    fn egress_for(&self, next_hop: &IpAddress) -> Option<String> {
        self.core.ports.iter().find_map(|p| {
            let (ip, mask) = p.ip?;
            next_hop.same_subnet(&ip, &mask).then(|| p.name.clone())
        })
    }

    // ---- OSPF ----

    /// 启用 OSPF 进程；发送回调接入内部发件箱。
    pub fn enable_ospf(&mut self, router_id: RouterId, version: OspfVersion) {
        let mut process = OspfProcess::new(router_id, version);
        let outbox: OspfOutbox = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&outbox);
        process.set_send_callback(Box::new(move |iface, packet, dest| {
            sink.lock().expect("ospf outbox lock").push(OspfOutboxEntry {
                iface: iface.to_string(),
                packet: packet.clone(),
                dest,
            });
        }));
        info!(router = %self.core.name, %router_id, "启用 OSPF 进程");
        self.ospf = Some(process);
        self.ospf_outbox = Some(outbox);
    }

    pub fn ospf(&self) -> Option<&OspfProcess> {
        self.ospf.as_ref()
    }

    pub fn ospf_mut(&mut self) -> Option<&mut OspfProcess> {
        self.ospf.as_mut()
    }

    /// 把 OSPF 发件箱中的报文封装为 IPv4 帧发出。
    fn drain_ospf_outbox(&mut self, sim: &mut Simulator, net: &mut Network) {
        let Some(outbox) = self.ospf_outbox.as_ref() else {
            return;
        };
        let pending: Vec<OspfOutboxEntry> = {
            let mut guard = outbox.lock().expect("ospf outbox lock");
            guard.drain(..).collect()
        };
        for entry in pending {
            let Some(idx) = self.port_index(&entry.iface) else {
                trace!(iface = %entry.iface, "发件箱接口不存在，报文丢弃");
                continue;
            };
            let Some((src_ip, _)) = self.core.ports[idx].ip else {
                continue;
            };
            let (dst_ip, dst_mac) = match entry.dest {
                OspfDest::AllSpfRouters | OspfDest::AllDrRouters => {
                    (ALL_SPF_ROUTERS_V4, OSPF_MCAST_MAC)
                }
                OspfDest::Unicast(ip) => match self.arp.lookup(&ip) {
                    Some(mac) => (ip, mac),
                    None => {
                        trace!(dst = %ip, "OSPF 单播目的无 ARP 条目，报文丢弃");
                        continue;
                    }
                },
            };
            let payload =
                serde_json::to_vec(&entry.packet).expect("ospf packet serializes");
            let pkt = Ipv4Packet::new(src_ip, dst_ip, PROTO_OSPF, 1, payload);
            let frame = EthernetFrame::new(
                self.core.ports[idx].mac,
                dst_mac,
                EtherType::Ipv4,
                pkt.to_bytes(),
            );
            let port = &self.core.ports[idx];
            if !port.admin_up {
                continue;
            }
            let from = PortRef {
                device: self.core.id,
                port: idx,
            };
            let _ = net.transmit_on(port.cable, from, frame, sim);
        }
    }

    /// SPF 结果整体替换路由表中的 OSPF 路由。
    fn install_spf_routes(&mut self) {
        use crate::ospf::SpfRouteKind;
        let Some(engine) = self.ospf.as_mut() else {
            return;
        };
        let spf_routes = engine.run_spf();
        let routes: Vec<Route> = spf_routes
            .into_iter()
            .map(|r| {
                let kind = match r.kind {
                    SpfRouteKind::IntraArea => RouteKind::OspfIntraArea,
                    SpfRouteKind::InterArea => RouteKind::OspfInterArea,
                    SpfRouteKind::External => RouteKind::OspfExternal,
                };
                Route::new(r.network, r.mask, r.next_hop, r.interface, kind, r.cost)
            })
            .collect();
        debug!(router = %self.core.name, count = routes.len(), "安装 SPF 路由");
        self.table.replace_ospf(routes);
    }

    // ---- 数据面 ----

    fn notify_drop(&mut self, reason: DropReason, pkt: &Ipv4Packet) {
        self.stats.packets_dropped += 1;
        if reason == DropReason::TtlExpired {
            self.stats.ttl_expired += 1;
        }
        warn!(
            router = %self.core.name,
            src = %pkt.src,
            dst = %pkt.dst,
            reason = %reason,
            "报文丢弃"
        );
        let ev = DropEvent {
            reason,
            src: pkt.src,
            dst: pkt.dst,
        };
        for cb in &mut self.drop_cbs {
            cb(&ev);
        }
    }

    /// 解析出接口与下一跳并发出（本机始发与转发共用）。
    fn resolve_and_send(
        &mut self,
        pkt: &Ipv4Packet,
        sim: &mut Simulator,
        net: &mut Network,
    ) -> Result<ForwardEvent, DropReason> {
        let (iface, next_hop) = {
            let route = self.table.lookup(&pkt.dst).ok_or(DropReason::NoRoute)?;
            (route.interface.clone(), route.next_hop.unwrap_or(pkt.dst))
        };
        let idx = self.port_index(&iface).ok_or(DropReason::LinkDown)?;
        if !self.core.ports[idx].is_up() {
            return Err(DropReason::LinkDown);
        }
        let dst_mac = self.arp.lookup(&next_hop).ok_or(DropReason::NoArpEntry)?;
        let frame = EthernetFrame::new(
            self.core.ports[idx].mac,
            dst_mac,
            EtherType::Ipv4,
            pkt.to_bytes(),
        );
        let from = PortRef {
            device: self.core.id,
            port: idx,
        };
        match net.transmit_on(self.core.ports[idx].cable, from, frame, sim) {
            TxResult::Sent => Ok(ForwardEvent {
                interface: iface,
                next_hop,
                dst: pkt.dst,
                ttl: pkt.ttl,
            }),
            _ => Err(DropReason::LinkDown),
        }
    }

    /// 转发流程：先判 TTL，再查路由，再解析 ARP 重新封装发出。
    /// 收到 TTL≤1 的报文以 "TTL expired" 丢弃，绝不转发。
    #[tracing::instrument(skip(self, pkt, sim, net), fields(router = %self.core.name, dst = %pkt.dst, ttl = pkt.ttl))]
    fn forward_packet(&mut self, mut pkt: Ipv4Packet, sim: &mut Simulator, net: &mut Network) {
        self.stats.packets_received += 1;

        if pkt.ttl <= 1 {
            self.notify_drop(DropReason::TtlExpired, &pkt);
            return;
        }
        pkt.ttl -= 1;

        match self.resolve_and_send(&pkt, sim, net) {
            Ok(ev) => {
                self.stats.packets_forwarded += 1;
                debug!(iface = %ev.interface, next_hop = %ev.next_hop, "报文已转发");
                for cb in &mut self.forward_cbs {
                    cb(&ev);
                }
            }
            Err(reason) => self.notify_drop(reason, &pkt),
        }
    }

    /// 投递给本机的报文：应答 ICMP 回显、上送 OSPF 进程。
    fn local_deliver(
        &mut self,
        port: usize,
        pkt: Ipv4Packet,
        sim: &mut Simulator,
        net: &mut Network,
    ) {
        match pkt.protocol {
            PROTO_ICMP => {
                if let Ok(IcmpMessage::EchoRequest { ident, seq }) =
                    IcmpMessage::from_bytes(&pkt.payload)
                {
                    debug!(router = %self.core.name, from = %pkt.src, seq, "应答回显请求");
                    let Some((my_ip, _)) = self.core.ports[port].ip else {
                        return;
                    };
                    let reply = Ipv4Packet::new(
                        my_ip,
                        pkt.src,
                        PROTO_ICMP,
                        64,
                        IcmpMessage::EchoReply { ident, seq }.to_bytes(),
                    );
                    if let Err(reason) = self.resolve_and_send(&reply, sim, net) {
                        trace!(reason = %reason, "回显应答发送失败");
                    }
                }
            }
            PROTO_OSPF => {
                let iface = self.core.ports[port].name.clone();
                let now = sim.now();
                if let Some(engine) = self.ospf.as_mut() {
                    match serde_json::from_slice::<OspfPacket>(&pkt.payload) {
                        Ok(packet) => engine.process_packet(&iface, pkt.src, &packet, now),
                        Err(e) => trace!(error = %e, "OSPF 报文解析失败"),
                    }
                    self.drain_ospf_outbox(sim, net);
                    if self.ospf.as_mut().is_some_and(|e| e.take_spf_dirty()) {
                        self.install_spf_routes();
                    }
                }
            }
            other => {
                trace!(protocol = other, "未识别协议，忽略");
            }
        }
    }
}

impl Device for Router {
    fn core(&self) -> &DeviceCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut DeviceCore {
        &mut self.core
    }

    fn kind(&self) -> DeviceKind {
        DeviceKind::Router
    }

    #[tracing::instrument(skip(self, frame, sim, net), fields(router = %self.core.name))]
    fn on_frame(
        &mut self,
        port: usize,
        frame: EthernetFrame,
        sim: &mut Simulator,
        net: &mut Network,
    ) {
        match frame.ethertype {
            EtherType::Ipv4 => match Ipv4Packet::from_bytes(&frame.payload) {
                Ok(pkt) => {
                    if self.is_local_ip(&pkt.dst) || pkt.dst == ALL_SPF_ROUTERS_V4 {
                        self.local_deliver(port, pkt, sim, net);
                    } else {
                        self.forward_packet(pkt, sim, net);
                    }
                }
                Err(e) => trace!(error = %e, "IPv4 解析失败，帧丢弃"),
            },
            other => {
                trace!(ethertype = ?other, "路由器忽略该帧");
            }
        }
    }

    fn on_tick(&mut self, sim: &mut Simulator, net: &mut Network) {
        if self.ospf.is_some() {
            let now = sim.now();
            if let Some(engine) = self.ospf.as_mut() {
                engine.tick(now);
            }
            self.drain_ospf_outbox(sim, net);
            if self.ospf.as_mut().is_some_and(|e| e.take_spf_dirty()) {
                self.install_spf_routes();
            }
        }
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
