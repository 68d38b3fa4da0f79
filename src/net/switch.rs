//! 交换机
//!
//! 入帧学习源 MAC 到入端口的映射；目的已知则仅转发到对应端口，
//! 未知单播与广播向同 VLAN 的其余运行端口泛洪。断电即丢弃全部
//! 帧（不学习、不转发），并丢弃动态表项。

use super::device::{Device, DeviceCore, DeviceKind};
use super::frame::EthernetFrame;
use super::id::{DeviceId, PortRef};
use super::mac_table::MacTable;
use super::network::Network;
use crate::addr::MacAddress;
use crate::sim::Simulator;
use std::any::Any;
use tracing::{debug, trace};

/// 交换统计。
#[derive(Debug, Default, Clone, Copy)]
pub struct SwitchStats {
    pub frames_forwarded: u64,
    pub frames_flooded: u64,
    /// 目的端口即入端口时过滤。
    pub frames_filtered: u64,
}

/// 交换机节点
pub struct Switch {
    core: DeviceCore,
    table: MacTable,
    stats: SwitchStats,
}

impl Switch {
    pub fn new(id: DeviceId, name: impl Into<String>, port_macs: Vec<MacAddress>) -> Switch {
        let ports = port_macs
            .into_iter()
            .enumerate()
            .map(|(i, mac)| super::cable::Port::new(format!("fa0/{}", i + 1), mac))
            .collect();
        Switch {
            core: DeviceCore::new(id, name, ports),
            table: MacTable::new(),
            stats: SwitchStats::default(),
        }
    }

    pub fn mac_table(&self) -> &MacTable {
        &self.table
    }

    pub fn mac_table_mut(&mut self) -> &mut MacTable {
        &mut self.table
    }

    pub fn port(&self, name: &str) -> Option<&super::cable::Port> {
        self.core.ports.iter().find(|p| p.name == name)
    }

    pub fn stats(&self) -> &SwitchStats {
        &self.stats
    }

    pub fn set_port_vlan(&mut self, name: &str, vlan: u16) -> bool {
        match self.core.ports.iter_mut().find(|p| p.name == name) {
            Some(p) => {
                p.vlan = vlan;
                true
            }
            None => false,
        }
    }

    fn flood(
        &mut self,
        ingress: usize,
        vlan: u16,
        frame: &EthernetFrame,
        sim: &mut Simulator,
        net: &mut Network,
    ) {
        let mut copies = 0;
        for idx in 0..self.core.ports.len() {
            if idx == ingress {
                continue;
            }
            let port = &self.core.ports[idx];
            if !port.is_up() || port.vlan != vlan {
                continue;
            }
            let from = PortRef {
                device: self.core.id,
                port: idx,
            };
            if net
                .transmit_on(port.cable, from, frame.clone(), sim)
                .is_sent()
            {
                copies += 1;
            }
        }
        if copies > 0 {
            self.stats.frames_flooded += 1;
        }
        trace!(copies, "泛洪");
    }
}

impl Device for Switch {
    fn core(&self) -> &DeviceCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut DeviceCore {
        &mut self.core
    }

    fn kind(&self) -> DeviceKind {
        DeviceKind::Switch
    }

    #[tracing::instrument(skip(self, frame, sim, net), fields(switch = %self.core.name))]
    fn on_frame(
        &mut self,
        port: usize,
        frame: EthernetFrame,
        sim: &mut Simulator,
        net: &mut Network,
    ) {
        let vlan = self.core.ports[port].vlan;

        // 入帧学习：同 VLAN 内一个 MAC 只映射一个端口
        if !frame.src.is_multicast() {
            self.table.learn(frame.src, vlan, port, sim.now());
        }

        if frame.dst.is_broadcast() || frame.dst.is_multicast() {
            debug!(dst = %frame.dst, "广播/组播，泛洪");
            self.flood(port, vlan, &frame, sim, net);
            return;
        }

        match self.table.lookup(&frame.dst, vlan).map(|e| e.port) {
            Some(egress) if egress == port => {
                trace!("目的端口即入端口，过滤");
                self.stats.frames_filtered += 1;
            }
            Some(egress) => {
                let p = &self.core.ports[egress];
                let from = PortRef {
                    device: self.core.id,
                    port: egress,
                };
                if p.is_up()
                    && net
                        .transmit_on(p.cable, from, frame, sim)
                        .is_sent()
                {
                    self.stats.frames_forwarded += 1;
                }
            }
            None => {
                debug!(dst = %frame.dst, "未知单播，泛洪");
                self.flood(port, vlan, &frame, sim, net);
            }
        }
    }

    fn on_power_off(&mut self) {
        self.table.clear_dynamic();
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
