//! OSPF 接口
//!
//! 每条链路上的协议状态：Hello 定时、网络类型、DR/BDR 选举结果
//! 与邻居表。广播网络激活后先进入 Waiting 等待一个失效间隔
//! （等待定时器），期间收发 Hello 但不敲定 DR；点到点网络完全
//! 跳过选举。

use super::neighbor::{NeighborState, OspfNeighbor};
use super::types::{AreaId, RouterId, DEAD_INTERVAL, HELLO_INTERVAL};
use crate::addr::{IpAddress, SubnetMask};
use crate::sim::SimTime;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info};

/// 接口状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceState {
    Down,
    Waiting,
    PointToPoint,
    DrOther,
    Backup,
    Dr,
}

impl fmt::Display for InterfaceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InterfaceState::Down => "Down",
            InterfaceState::Waiting => "Waiting",
            InterfaceState::PointToPoint => "PointToPoint",
            InterfaceState::DrOther => "DROther",
            InterfaceState::Backup => "Backup",
            InterfaceState::Dr => "DR",
        };
        f.write_str(s)
    }
}

/// 网络类型。点到点/点到多点不选举 DR。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OspfNetworkType {
    PointToPoint,
    Broadcast,
    PointToMultipoint,
}

/// 接口激活选项。
#[derive(Debug, Clone)]
pub struct InterfaceOpts {
    pub network_type: OspfNetworkType,
    pub priority: u8,
    pub hello_interval: u16,
    pub dead_interval: u32,
    /// 接口带宽（bps），用于按参考带宽推导开销。
    pub bandwidth_bps: u64,
    /// 显式开销覆盖带宽推导。
    pub cost: Option<u32>,
    pub passive: bool,
}

impl Default for InterfaceOpts {
    fn default() -> Self {
        InterfaceOpts {
            network_type: OspfNetworkType::Broadcast,
            priority: 1,
            hello_interval: HELLO_INTERVAL,
            dead_interval: DEAD_INTERVAL,
            bandwidth_bps: 100_000_000,
            cost: None,
            passive: false,
        }
    }
}

#[derive(Debug)]
pub struct OspfInterface {
    pub name: String,
    pub ip: IpAddress,
    pub mask: SubnetMask,
    pub area: AreaId,
    pub interface_id: u32,
    pub network_type: OspfNetworkType,
    pub state: InterfaceState,
    pub hello_interval: u16,
    pub dead_interval: u32,
    pub priority: u8,
    pub cost: u32,
    pub passive: bool,
    pub dr: RouterId,
    pub bdr: RouterId,
    pub neighbors: BTreeMap<RouterId, OspfNeighbor>,
    pub(crate) next_hello_at: SimTime,
    pub(crate) wait_until: Option<SimTime>,
}

impl OspfInterface {
    pub fn new(
        name: impl Into<String>,
        ip: IpAddress,
        mask: SubnetMask,
        area: AreaId,
        interface_id: u32,
        cost: u32,
        opts: &InterfaceOpts,
        now: SimTime,
    ) -> OspfInterface {
        let (state, wait_until) = if opts.passive {
            // 被动接口参与路由内容但从不发送 Hello、不形成邻接
            match opts.network_type {
                OspfNetworkType::Broadcast => (InterfaceState::DrOther, None),
                _ => (InterfaceState::PointToPoint, None),
            }
        } else {
            match opts.network_type {
                OspfNetworkType::Broadcast => (
                    InterfaceState::Waiting,
                    Some(now.saturating_add(SimTime::from_secs(opts.dead_interval as u64))),
                ),
                _ => (InterfaceState::PointToPoint, None),
            }
        };
        OspfInterface {
            name: name.into(),
            ip,
            mask,
            area,
            interface_id,
            network_type: opts.network_type,
            state,
            hello_interval: opts.hello_interval,
            dead_interval: opts.dead_interval,
            priority: opts.priority,
            cost,
            passive: opts.passive,
            dr: RouterId::ZERO,
            bdr: RouterId::ZERO,
            neighbors: BTreeMap::new(),
            next_hello_at: now,
            wait_until,
        }
    }

    pub fn full_neighbors(&self) -> impl Iterator<Item = &OspfNeighbor> {
        self.neighbors.values().filter(|n| n.is_full())
    }

    pub fn has_full_neighbor(&self) -> bool {
        self.full_neighbors().next().is_some()
    }

    /// DR/BDR 选举。候选：自身与双向邻居中优先级非零者；
    /// 优先级高者当选，相同则路由器标识大者当选；次席为 BDR。
    /// 优先级 0 永远不参选。
    pub fn run_election(&mut self, self_id: RouterId) {
        if self.network_type != OspfNetworkType::Broadcast {
            self.dr = RouterId::ZERO;
            self.bdr = RouterId::ZERO;
            self.state = InterfaceState::PointToPoint;
            return;
        }

        let mut candidates: Vec<(u8, RouterId)> = Vec::new();
        if self.priority > 0 {
            candidates.push((self.priority, self_id));
        }
        for nbr in self.neighbors.values() {
            if nbr.is_bidirectional() && nbr.priority > 0 {
                candidates.push((nbr.priority, nbr.router_id));
            }
        }
        // 优先级降序，同级按路由器标识降序
        candidates.sort_by(|a, b| b.cmp(a));

        let dr = candidates.first().map(|c| c.1).unwrap_or(RouterId::ZERO);
        let bdr = candidates.get(1).map(|c| c.1).unwrap_or(RouterId::ZERO);

        if dr != self.dr || bdr != self.bdr {
            info!(iface = %self.name, %dr, %bdr, "DR/BDR 选举结果");
        } else {
            debug!(iface = %self.name, %dr, %bdr, "选举结果不变");
        }
        self.dr = dr;
        self.bdr = bdr;
        self.state = if dr == self_id {
            InterfaceState::Dr
        } else if bdr == self_id {
            InterfaceState::Backup
        } else {
            InterfaceState::DrOther
        };
    }
}
