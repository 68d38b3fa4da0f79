//! 设备周期事件与 ping 发起事件
//!
//! 协议定时器（OSPF Hello/失效、ICMP 超时清理）由周期 tick 驱动；
//! 设备断电后 tick 不再重调度，不会留下孤儿定时器。

use super::device::Device;
use super::id::DeviceId;
use super::net_world::NetWorld;
use crate::addr::IpAddress;
use crate::sim::{Event, SimTime, Simulator, World};
use tracing::{debug, info};

/// 事件：驱动设备协议定时器，并在设备仍上电时自我重调度。
#[derive(Debug)]
pub struct DeviceTick {
    pub device: DeviceId,
    pub period: SimTime,
}

impl Event for DeviceTick {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let DeviceTick { device, period } = *self;
        let w = world
            .as_any_mut()
            .downcast_mut::<NetWorld>()
            .expect("world must be NetWorld");
        let powered = w.net.device(device).is_some_and(|d| d.powered_on());
        if !powered {
            debug!(?device, "设备未上电，停止周期驱动");
            return;
        }
        w.net.tick_device(device, sim);
        sim.schedule_in(period, DeviceTick { device, period });
    }
}

/// 事件：由某台 PC 向目的地址发起一次 ping。
#[derive(Debug)]
pub struct StartPing {
    pub host: DeviceId,
    pub dst: IpAddress,
    pub ttl: u8,
}

impl Event for StartPing {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let StartPing { host, dst, ttl } = *self;
        let w = world
            .as_any_mut()
            .downcast_mut::<NetWorld>()
            .expect("world must be NetWorld");
        match w.net.start_ping(host, dst, ttl, sim) {
            Some(outcome) => info!(?host, dst = %dst, ?outcome, "发起 ping"),
            None => info!(?host, "ping 发起失败：设备不存在或不是 PC"),
        }
    }
}
