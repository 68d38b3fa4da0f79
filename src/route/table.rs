//! 路由表
//!
//! 线性最长前缀匹配。平局顺序：最长掩码 → 最低管理距离 → 最低度量 →
//! 最早配置。直连路由随接口地址增删自动维护；OSPF 路由每次 SPF
//! 计算后整体替换。

use super::entry::{Route, RouteKind};
use crate::addr::{IpAddress, SubnetMask};
use std::cmp::Reverse;
use tracing::{debug, trace};

#[derive(Debug, Default)]
pub struct RoutingTable {
    routes: Vec<Route>,
    next_seq: u64,
}

impl RoutingTable {
    pub fn new() -> RoutingTable {
        RoutingTable::default()
    }

    pub fn add(&mut self, mut route: Route) {
        route.seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        debug!(route = %route, "安装路由");
        self.routes.push(route);
    }

    /// 接口获得地址时安装直连路由；同接口旧的直连路由先移除。
    pub fn add_connected(&mut self, interface: &str, ip: IpAddress, mask: SubnetMask) {
        self.remove_connected(interface);
        self.add(Route::new(
            ip.mask_with(&mask),
            mask,
            None,
            interface,
            RouteKind::Connected,
            0,
        ));
    }

    /// 接口失去地址时移除其直连路由。
    pub fn remove_connected(&mut self, interface: &str) {
        self.routes
            .retain(|r| !(r.kind == RouteKind::Connected && r.interface == interface));
    }

    pub fn add_static(
        &mut self,
        network: IpAddress,
        mask: SubnetMask,
        next_hop: IpAddress,
        interface: &str,
        metric: u32,
    ) {
        self.add(Route::new(
            network,
            mask,
            Some(next_hop),
            interface,
            RouteKind::Static,
            metric,
        ));
    }

    pub fn remove_static(&mut self, network: IpAddress, mask: SubnetMask) {
        let network = network.mask_with(&mask);
        self.routes
            .retain(|r| !(r.kind == RouteKind::Static && r.network == network && r.mask == mask));
    }

    /// 设置默认路由（0.0.0.0/0）；已有的默认路由被替换。
    pub fn set_default(&mut self, next_hop: IpAddress, interface: &str) {
        self.routes.retain(|r| r.kind != RouteKind::Default);
        let mask = SubnetMask::from_prefix_len(0).expect("prefix 0");
        self.add(Route::new(
            IpAddress::UNSPECIFIED,
            mask,
            Some(next_hop),
            interface,
            RouteKind::Default,
            0,
        ));
    }

    /// SPF 结果整体替换全部 OSPF 路由。
    pub fn replace_ospf(&mut self, routes: Vec<Route>) {
        self.routes.retain(|r| !r.kind.is_ospf());
        for r in routes {
            self.add(r);
        }
    }

    /// 最长前缀匹配查找。
    pub fn lookup(&self, ip: &IpAddress) -> Option<&Route> {
        let best = self
            .routes
            .iter()
            .filter(|r| r.matches(ip))
            .min_by_key(|r| (Reverse(r.mask.prefix_len()), r.distance, r.metric, r.seq));
        trace!(dst = %ip, hit = ?best.map(|r| r.to_string()), "路由查找");
        best
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
