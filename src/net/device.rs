//! 设备抽象
//!
//! 设备拥有端口、电源状态与各自的表（ARP/MAC/路由）。设备之间只
//! 通过显式的帧投递通信，绝不共享内存。具体形态（PC、集线器、
//! 交换机、路由器）以组合方式复用 `DeviceCore`，避免深继承链。

use super::cable::Port;
use super::frame::EthernetFrame;
use super::id::DeviceId;
use super::network::Network;
use crate::sim::Simulator;
use std::any::Any;

/// 设备形态。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Pc,
    Hub,
    Switch,
    Router,
}

/// 所有设备共享的骨架：标识、名称、电源与端口。
#[derive(Debug)]
pub struct DeviceCore {
    pub id: DeviceId,
    pub name: String,
    pub powered: bool,
    pub ports: Vec<Port>,
}

impl DeviceCore {
    pub fn new(id: DeviceId, name: impl Into<String>, ports: Vec<Port>) -> DeviceCore {
        DeviceCore {
            id,
            name: name.into(),
            powered: true,
            ports,
        }
    }
}

/// 设备接口
pub trait Device: Send {
    fn core(&self) -> &DeviceCore;

    fn core_mut(&mut self) -> &mut DeviceCore;

    fn kind(&self) -> DeviceKind;

    /// 处理到达本设备某端口的帧。
    fn on_frame(
        &mut self,
        port: usize,
        frame: EthernetFrame,
        sim: &mut Simulator,
        net: &mut Network,
    );

    /// 周期性驱动（协议定时器、超时清理）。
    fn on_tick(&mut self, _sim: &mut Simulator, _net: &mut Network) {}

    /// 断电时丢弃易失状态（如交换机动态 MAC 表）。
    fn on_power_off(&mut self) {}

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn id(&self) -> DeviceId {
        self.core().id
    }

    fn name(&self) -> &str {
        &self.core().name
    }

    fn powered_on(&self) -> bool {
        self.core().powered
    }

    fn set_power(&mut self, on: bool) {
        self.core_mut().powered = on;
        if !on {
            self.on_power_off();
        }
    }

    fn ports(&self) -> &[Port] {
        &self.core().ports
    }

    fn ports_mut(&mut self) -> &mut [Port] {
        &mut self.core_mut().ports
    }

    fn port_index(&self, name: &str) -> Option<usize> {
        self.ports().iter().position(|p| p.name == name)
    }
}
