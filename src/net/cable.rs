//! 端口与线缆
//!
//! 端口属于唯一的设备，同一时间至多接入一根线缆；线缆连接恰好
//! 两个端口，双向传输。断开原子地清除两端链路状态并递增代数，
//! 使在途传输确定性失败而不是悄悄丢失。

use super::id::{CableId, PortRef};
use crate::addr::{IpAddress, MacAddress, SubnetMask};
use crate::sim::SimTime;

/// 设备端口（接口）。
#[derive(Debug, Clone)]
pub struct Port {
    pub name: String,
    pub mac: MacAddress,
    pub ip: Option<(IpAddress, SubnetMask)>,
    /// 管理状态（shutdown / no shutdown）。
    pub admin_up: bool,
    /// 接入 VLAN（默认 1）。
    pub vlan: u16,
    pub cable: Option<CableId>,
}

impl Port {
    pub fn new(name: impl Into<String>, mac: MacAddress) -> Port {
        Port {
            name: name.into(),
            mac,
            ip: None,
            admin_up: true,
            vlan: 1,
            cable: None,
        }
    }

    /// 运行状态：管理开启且接有线缆。
    pub fn is_up(&self) -> bool {
        self.admin_up && self.cable.is_some()
    }

    pub fn set_ip(&mut self, ip: IpAddress, mask: SubnetMask) {
        self.ip = Some((ip, mask));
    }

    pub fn clear_ip(&mut self) {
        self.ip = None;
    }
}

/// 线缆：连接两个端口。
#[derive(Debug, Clone)]
pub struct Cable {
    pub id: CableId,
    pub a: PortRef,
    pub b: PortRef,
    pub latency: SimTime,
    /// 断开后递增；在途帧携带发出时的代数，不匹配即判定丢失。
    pub generation: u64,
    pub connected: bool,
}

impl Cable {
    pub fn new(id: CableId, a: PortRef, b: PortRef, latency: SimTime) -> Cable {
        Cable {
            id,
            a,
            b,
            latency,
            generation: 0,
            connected: true,
        }
    }

    /// 给定一端，返回另一端。
    pub fn peer(&self, end: PortRef) -> PortRef {
        if end == self.a { self.b } else { self.a }
    }
}
