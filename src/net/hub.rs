//! 集线器
//!
//! 交换机的退化形态：永远泛洪、从不学习。

use super::device::{Device, DeviceCore, DeviceKind};
use super::frame::EthernetFrame;
use super::id::{DeviceId, PortRef};
use super::network::Network;
use crate::addr::MacAddress;
use crate::sim::Simulator;
use std::any::Any;
use tracing::trace;

/// 集线器节点
pub struct Hub {
    core: DeviceCore,
}

impl Hub {
    pub fn new(id: DeviceId, name: impl Into<String>, port_macs: Vec<MacAddress>) -> Hub {
        let ports = port_macs
            .into_iter()
            .enumerate()
            .map(|(i, mac)| super::cable::Port::new(format!("p{}", i + 1), mac))
            .collect();
        Hub {
            core: DeviceCore::new(id, name, ports),
        }
    }
}

impl Device for Hub {
    fn core(&self) -> &DeviceCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut DeviceCore {
        &mut self.core
    }

    fn kind(&self) -> DeviceKind {
        DeviceKind::Hub
    }

    fn on_frame(
        &mut self,
        port: usize,
        frame: EthernetFrame,
        sim: &mut Simulator,
        net: &mut Network,
    ) {
        trace!(hub = %self.core.name, port, "集线器泛洪");
        for idx in 0..self.core.ports.len() {
            if idx == port {
                continue;
            }
            let p = &self.core.ports[idx];
            if !p.is_up() {
                continue;
            }
            let from = PortRef {
                device: self.core.id,
                port: idx,
            };
            let _ = net.transmit_on(p.cable, from, frame.clone(), sim);
        }
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
