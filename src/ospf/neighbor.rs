//! OSPF 邻居
//!
//! 邻居状态机实例，身份为（接口，对端路由器标识）。状态顺序
//! 即邻接推进顺序，比较运算直接反映"至少达到某状态"。

use super::types::RouterId;
use crate::addr::IpAddress;
use crate::sim::SimTime;
use std::fmt;

/// 邻居状态机状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NeighborState {
    Down,
    Init,
    TwoWay,
    ExStart,
    Exchange,
    Loading,
    Full,
}

impl fmt::Display for NeighborState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NeighborState::Down => "Down",
            NeighborState::Init => "Init",
            NeighborState::TwoWay => "2-Way",
            NeighborState::ExStart => "ExStart",
            NeighborState::Exchange => "Exchange",
            NeighborState::Loading => "Loading",
            NeighborState::Full => "Full",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone)]
pub struct OspfNeighbor {
    pub router_id: RouterId,
    pub address: IpAddress,
    pub priority: u8,
    pub state: NeighborState,
    /// 最近一次 Hello 的接收时刻；失效定时器以此为基准。
    pub last_hello: SimTime,
    pub dr: RouterId,
    pub bdr: RouterId,
}

impl OspfNeighbor {
    pub fn new(router_id: RouterId, address: IpAddress, now: SimTime) -> OspfNeighbor {
        OspfNeighbor {
            router_id,
            address,
            priority: 1,
            state: NeighborState::Down,
            last_hello: now,
            dr: RouterId::ZERO,
            bdr: RouterId::ZERO,
        }
    }

    /// 双向可达（2-Way 及以上）。
    pub fn is_bidirectional(&self) -> bool {
        self.state >= NeighborState::TwoWay
    }

    pub fn is_full(&self) -> bool {
        self.state == NeighborState::Full
    }
}
