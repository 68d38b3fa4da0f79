//! OSPF 进程配置
//!
//! network 语句（网络/通配符 → 区域）、被动接口、区域类型与
//! 参考带宽。

use super::types::{AreaId, OspfVersion, RouterId, DEFAULT_REFERENCE_BANDWIDTH};
use crate::addr::IpAddress;
use std::collections::{BTreeMap, BTreeSet};

/// 区域类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AreaType {
    #[default]
    Normal,
    Stub,
    Nssa,
}

/// 一条 network 语句：通配符匹配的接口划入指定区域。
#[derive(Debug, Clone, Copy)]
pub struct NetworkBinding {
    pub network: IpAddress,
    pub wildcard: IpAddress,
    pub area: AreaId,
}

impl NetworkBinding {
    /// 通配符匹配：通配位为 1 的位不参与比较。
    pub fn matches(&self, ip: IpAddress) -> bool {
        let care = !self.wildcard.to_u32();
        ip.to_u32() & care == self.network.to_u32() & care
    }
}

#[derive(Debug, Clone)]
pub struct OspfConfig {
    pub router_id: RouterId,
    pub version: OspfVersion,
    pub reference_bandwidth: u64,
    pub networks: Vec<NetworkBinding>,
    pub passive_interfaces: BTreeSet<String>,
    pub area_types: BTreeMap<AreaId, AreaType>,
}

impl OspfConfig {
    pub fn new(router_id: RouterId, version: OspfVersion) -> OspfConfig {
        OspfConfig {
            router_id,
            version,
            reference_bandwidth: DEFAULT_REFERENCE_BANDWIDTH,
            networks: Vec::new(),
            passive_interfaces: BTreeSet::new(),
            area_types: BTreeMap::new(),
        }
    }

    pub fn add_network(&mut self, network: IpAddress, wildcard: IpAddress, area: AreaId) {
        self.networks.push(NetworkBinding {
            network,
            wildcard,
            area,
        });
    }

    /// 接口地址匹配到的区域（按配置顺序取首个命中）。
    pub fn area_for(&self, ip: IpAddress) -> Option<AreaId> {
        self.networks.iter().find(|b| b.matches(ip)).map(|b| b.area)
    }

    pub fn set_passive(&mut self, iface: impl Into<String>) {
        self.passive_interfaces.insert(iface.into());
    }

    pub fn is_passive(&self, iface: &str) -> bool {
        self.passive_interfaces.contains(iface)
    }

    pub fn set_area_type(&mut self, area: AreaId, t: AreaType) {
        self.area_types.insert(area, t);
    }

    pub fn area_type(&self, area: AreaId) -> AreaType {
        self.area_types.get(&area).copied().unwrap_or_default()
    }

    /// 按参考带宽推导接口开销（至少为 1）。
    pub fn cost_for_bandwidth(&self, bandwidth_bps: u64) -> u32 {
        if bandwidth_bps == 0 {
            return 1;
        }
        ((self.reference_bandwidth / bandwidth_bps).max(1)).min(u32::MAX as u64) as u32
    }
}
