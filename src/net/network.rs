//! 网络拓扑管理
//!
//! 持有全部设备与线缆；提供连接/断开契约与帧的调度投递。
//! `connect` 在任一端口已占用时失败（返回 None）；`disconnect`
//! 幂等，并通过线缆代数使在途帧确定性失效。

use super::cable::{Cable, Port};
use super::deliver_frame::DeliverFrame;
use super::device::Device;
use super::frame::EthernetFrame;
use super::host::{Host, PingLaunch};
use super::hub::Hub;
use super::id::{CableId, DeviceId, PortRef};
use super::router::Router;
use super::stats::NetworkStats;
use super::switch::Switch;
use crate::addr::{IpAddress, MacAddress};
use crate::sim::{SimTime, Simulator};
use tracing::{debug, info, trace, warn};

/// 发送结果：调用方必须检查，发送失败是显式的可达性失败。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxResult {
    Sent,
    /// 端口未接线缆。
    NoCable,
    /// 线缆已断开或端口管理关闭。
    LinkDown,
    /// 设备未上电。
    PowerOff,
}

impl TxResult {
    pub fn is_sent(&self) -> bool {
        matches!(self, TxResult::Sent)
    }
}

/// 网络拓扑
pub struct Network {
    devices: Vec<Option<Box<dyn Device>>>,
    cables: Vec<Cable>,
    next_mac: u64,
    default_latency: SimTime,
    pub stats: NetworkStats,
}

impl Default for Network {
    fn default() -> Self {
        Network {
            devices: Vec::new(),
            cables: Vec::new(),
            next_mac: 1,
            default_latency: SimTime::from_micros(1),
            stats: NetworkStats::default(),
        }
    }
}

impl Network {
    /// 分配本地管理的 MAC 地址（02:4E:4C:xx:xx:xx）。
    fn alloc_mac(&mut self) -> MacAddress {
        let n = self.next_mac;
        self.next_mac += 1;
        MacAddress::new([
            0x02,
            0x4E,
            0x4C,
            (n >> 16) as u8,
            (n >> 8) as u8,
            n as u8,
        ])
    }

    fn push_device(&mut self, dev: Box<dyn Device>) -> DeviceId {
        let id = dev.id();
        self.devices.push(Some(dev));
        id
    }

    fn next_id(&self) -> DeviceId {
        DeviceId(self.devices.len())
    }

    /// 添加 PC（单网口 eth0）。
    pub fn add_pc(&mut self, name: impl Into<String>) -> DeviceId {
        let id = self.next_id();
        let mac = self.alloc_mac();
        self.push_device(Box::new(Host::new(id, name, mac)))
    }

    /// 添加集线器。
    pub fn add_hub(&mut self, name: impl Into<String>, ports: usize) -> DeviceId {
        let id = self.next_id();
        let macs: Vec<MacAddress> = (0..ports).map(|_| self.alloc_mac()).collect();
        self.push_device(Box::new(Hub::new(id, name, macs)))
    }

    /// 添加交换机。
    pub fn add_switch(&mut self, name: impl Into<String>, ports: usize) -> DeviceId {
        let id = self.next_id();
        let macs: Vec<MacAddress> = (0..ports).map(|_| self.alloc_mac()).collect();
        self.push_device(Box::new(Switch::new(id, name, macs)))
    }

    /// 添加路由器，接口名由调用方给定。
    pub fn add_router(&mut self, name: impl Into<String>, ifaces: &[&str]) -> DeviceId {
        let id = self.next_id();
        let port_macs: Vec<(String, MacAddress)> = ifaces
            .iter()
            .map(|n| (n.to_string(), self.alloc_mac()))
            .collect();
        self.push_device(Box::new(Router::new(id, name, port_macs)))
    }

    pub fn device(&self, id: DeviceId) -> Option<&dyn Device> {
        self.devices.get(id.0)?.as_deref()
    }

    pub fn device_mut(&mut self, id: DeviceId) -> Option<&mut (dyn Device + 'static)> {
        match self.devices.get_mut(id.0) {
            Some(Some(dev)) => Some(dev.as_mut()),
            _ => None,
        }
    }

    pub fn host_mut(&mut self, id: DeviceId) -> Option<&mut Host> {
        self.device_mut(id)?.as_any_mut().downcast_mut::<Host>()
    }

    pub fn switch_mut(&mut self, id: DeviceId) -> Option<&mut Switch> {
        self.device_mut(id)?.as_any_mut().downcast_mut::<Switch>()
    }

    pub fn router_mut(&mut self, id: DeviceId) -> Option<&mut Router> {
        self.device_mut(id)?.as_any_mut().downcast_mut::<Router>()
    }

    /// 按接口名解析端口引用。
    pub fn port_ref(&self, id: DeviceId, iface: &str) -> Option<PortRef> {
        let dev = self.device(id)?;
        let port = dev.port_index(iface)?;
        Some(PortRef { device: id, port })
    }

    fn port(&self, r: PortRef) -> Option<&Port> {
        self.device(r.device)?.ports().get(r.port)
    }

    fn port_mut(&mut self, r: PortRef) -> Option<&mut Port> {
        self.device_mut(r.device)?.ports_mut().get_mut(r.port)
    }

    /// 连接两个端口。任一端口已接线缆、端口不存在或两端相同时
    /// 返回 None，不改变任何状态。
    pub fn connect(&mut self, a: PortRef, b: PortRef) -> Option<CableId> {
        self.connect_with_latency(a, b, self.default_latency)
    }

    pub fn connect_with_latency(
        &mut self,
        a: PortRef,
        b: PortRef,
        latency: SimTime,
    ) -> Option<CableId> {
        if a == b {
            return None;
        }
        match (self.port(a), self.port(b)) {
            (Some(pa), Some(pb)) => {
                if pa.cable.is_some() || pb.cable.is_some() {
                    warn!(?a, ?b, "端口已占用，连接失败");
                    return None;
                }
            }
            _ => return None,
        }
        let id = CableId(self.cables.len());
        self.cables.push(Cable::new(id, a, b, latency));
        self.port_mut(a).expect("port a exists").cable = Some(id);
        self.port_mut(b).expect("port b exists").cable = Some(id);
        info!(cable = ?id, ?a, ?b, "线缆已连接");
        Some(id)
    }

    /// 断开线缆：总是成功且幂等；原子清除两端链路状态并递增代数。
    pub fn disconnect(&mut self, id: CableId) {
        let Some(cable) = self.cables.get_mut(id.0) else {
            return;
        };
        if !cable.connected {
            return;
        }
        cable.connected = false;
        cable.generation += 1;
        let (a, b) = (cable.a, cable.b);
        for end in [a, b] {
            if let Some(port) = self.port_mut(end) {
                if port.cable == Some(id) {
                    port.cable = None;
                }
            }
        }
        info!(cable = ?id, "线缆已断开");
    }

    pub fn cable(&self, id: CableId) -> Option<&Cable> {
        self.cables.get(id.0)
    }

    /// 从某端口发出一帧。发送方传入自己端口记录的线缆。
    #[tracing::instrument(skip(self, frame, sim, from), fields(from = ?from))]
    pub fn transmit_on(
        &mut self,
        cable: Option<CableId>,
        from: PortRef,
        frame: EthernetFrame,
        sim: &mut Simulator,
    ) -> TxResult {
        let Some(cid) = cable else {
            trace!("端口未接线缆");
            return TxResult::NoCable;
        };
        let Some(c) = self.cables.get(cid.0) else {
            return TxResult::NoCable;
        };
        if !c.connected {
            trace!(cable = ?cid, "线缆已断开，发送失败");
            return TxResult::LinkDown;
        }
        let to = c.peer(from);
        let arrive = sim.now().saturating_add(c.latency);
        debug!(cable = ?cid, ?to, ?arrive, "调度帧投递事件");
        sim.schedule(
            arrive,
            DeliverFrame {
                to,
                cable: cid,
                generation: c.generation,
                frame,
            },
        );
        TxResult::Sent
    }

    /// 帧到达：校验线缆代数与目的设备状态后交给设备处理。
    /// 校验失败的帧计入 `frames_lost`（确定性失效，不悄悄消失）。
    #[tracing::instrument(skip(self, frame, sim, to, cable), fields(to = ?to, cable = ?cable))]
    pub fn deliver(
        &mut self,
        to: PortRef,
        cable: CableId,
        generation: u64,
        frame: EthernetFrame,
        sim: &mut Simulator,
    ) {
        let valid = self
            .cables
            .get(cable.0)
            .map(|c| c.connected && c.generation == generation)
            .unwrap_or(false);
        if !valid {
            debug!("线缆在帧传输途中断开，帧丢失");
            self.stats.frames_lost += 1;
            return;
        }
        let deliverable = self
            .device(to.device)
            .map(|d| d.powered_on() && d.ports().get(to.port).is_some_and(|p| p.admin_up))
            .unwrap_or(false);
        if !deliverable {
            debug!("目的设备不可用，帧丢失");
            self.stats.frames_lost += 1;
            return;
        }
        self.stats.frames_delivered += 1;

        // 暂时把设备取出来，避免 &mut self 与 &mut device 的重叠借用。
        let mut dev = self.devices[to.device.0].take().expect("device exists");
        dev.on_frame(to.port, frame, sim, self);
        self.devices[to.device.0] = Some(dev);
    }

    /// 驱动一个设备的周期 tick（take/put-back）。
    pub fn tick_device(&mut self, id: DeviceId, sim: &mut Simulator) {
        let Some(slot) = self.devices.get_mut(id.0) else {
            return;
        };
        let Some(mut dev) = slot.take() else {
            return;
        };
        if dev.powered_on() {
            dev.on_tick(sim, self);
        }
        self.devices[id.0] = Some(dev);
    }

    /// 由某台 PC 发起 ping。
    pub fn start_ping(
        &mut self,
        host: DeviceId,
        dst: IpAddress,
        ttl: u8,
        sim: &mut Simulator,
    ) -> Option<PingLaunch> {
        let Some(slot) = self.devices.get_mut(host.0) else {
            return None;
        };
        let mut dev = slot.take()?;
        let outcome = dev
            .as_any_mut()
            .downcast_mut::<Host>()
            .map(|h| h.ping(dst, ttl, sim, self));
        self.devices[host.0] = Some(dev);
        outcome
    }

    /// 设备上电/断电。
    pub fn set_power(&mut self, id: DeviceId, on: bool) {
        if let Some(dev) = self.device_mut(id) {
            info!(device = %dev.name(), on, "电源状态变更");
            dev.set_power(on);
        }
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }
}
