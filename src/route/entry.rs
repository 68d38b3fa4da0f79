//! 路由条目

use crate::addr::{IpAddress, SubnetMask};
use std::fmt;

/// 路由来源类型。管理距离由来源决定。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    Connected,
    Static,
    Default,
    OspfIntraArea,
    OspfInterArea,
    OspfExternal,
}

impl RouteKind {
    /// 默认管理距离：直连 0，静态/默认 1，OSPF 110。
    pub fn admin_distance(&self) -> u8 {
        match self {
            RouteKind::Connected => 0,
            RouteKind::Static | RouteKind::Default => 1,
            RouteKind::OspfIntraArea | RouteKind::OspfInterArea | RouteKind::OspfExternal => 110,
        }
    }

    pub fn is_ospf(&self) -> bool {
        matches!(
            self,
            RouteKind::OspfIntraArea | RouteKind::OspfInterArea | RouteKind::OspfExternal
        )
    }
}

impl fmt::Display for RouteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RouteKind::Connected => "connected",
            RouteKind::Static => "static",
            RouteKind::Default => "default",
            RouteKind::OspfIntraArea => "ospf-intra-area",
            RouteKind::OspfInterArea => "ospf-inter-area",
            RouteKind::OspfExternal => "ospf-external",
        };
        f.write_str(s)
    }
}

/// 一条路由。`next_hop` 为 None 表示目的网络直连，报文直接投递给目的地。
#[derive(Debug, Clone)]
pub struct Route {
    pub network: IpAddress,
    pub mask: SubnetMask,
    pub next_hop: Option<IpAddress>,
    pub interface: String,
    pub kind: RouteKind,
    pub metric: u32,
    pub distance: u8,
    /// 手工配置顺序，LPM 平局时的最终决胜条件。
    pub(crate) seq: u64,
}

impl Route {
    pub fn new(
        network: IpAddress,
        mask: SubnetMask,
        next_hop: Option<IpAddress>,
        interface: impl Into<String>,
        kind: RouteKind,
        metric: u32,
    ) -> Route {
        Route {
            network: network.mask_with(&mask),
            mask,
            next_hop,
            interface: interface.into(),
            kind,
            metric,
            distance: kind.admin_distance(),
            seq: 0,
        }
    }

    /// 目的地址是否落在本路由的网络内。
    pub fn matches(&self, ip: &IpAddress) -> bool {
        ip.mask_with(&self.mask) == self.network
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} via {} dev {} [{}/{}] {}",
            self.network,
            self.mask.prefix_len(),
            self.next_hop
                .map(|nh| nh.to_string())
                .unwrap_or_else(|| "on-link".to_string()),
            self.interface,
            self.distance,
            self.metric,
            self.kind
        )
    }
}
