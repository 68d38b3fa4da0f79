//! OSPF 基础类型与协议常量

use crate::addr::IpAddress;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 路由器标识（32 位，点分十进制显示）。
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct RouterId(pub u32);

impl RouterId {
    pub const ZERO: RouterId = RouterId(0);

    pub fn from_ip(ip: IpAddress) -> RouterId {
        RouterId(ip.to_u32())
    }

    pub fn to_ip(self) -> IpAddress {
        IpAddress::from_u32(self.0)
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for RouterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_ip())
    }
}

/// 区域标识（点分十进制显示，骨干区域为 0.0.0.0）。
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct AreaId(pub u32);

impl AreaId {
    pub const BACKBONE: AreaId = AreaId(0);
}

impl fmt::Display for AreaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", IpAddress::from_u32(self.0))
    }
}

/// 协议版本。v3 的 Hello 不携带网络掩码而携带接口标识，
/// 组播目的地为 ff02::5。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OspfVersion {
    V2,
    V3,
}

/// 报文目的地。引擎只描述语义目的地，由传输层落地。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OspfDest {
    AllSpfRouters,
    AllDrRouters,
    Unicast(IpAddress),
}

impl OspfDest {
    /// 按版本渲染目的地址字符串。
    pub fn display_for(&self, version: OspfVersion) -> String {
        match (self, version) {
            (OspfDest::AllSpfRouters, OspfVersion::V2) => "224.0.0.5".to_string(),
            (OspfDest::AllSpfRouters, OspfVersion::V3) => "ff02::5".to_string(),
            (OspfDest::AllDrRouters, OspfVersion::V2) => "224.0.0.6".to_string(),
            (OspfDest::AllDrRouters, OspfVersion::V3) => "ff02::6".to_string(),
            (OspfDest::Unicast(ip), _) => ip.to_string(),
        }
    }
}

/// 默认 Hello 间隔（秒）。
pub const HELLO_INTERVAL: u16 = 10;
/// 默认失效间隔（秒）。
pub const DEAD_INTERVAL: u32 = 40;
/// LSA 最大寿命（秒），到龄即从 LSDB 冲刷。
pub const OSPF_MAX_AGE: u16 = 3600;
/// 自身 LSA 的刷新周期（秒）。
pub const LS_REFRESH_TIME: u16 = 1800;
/// 初始 LSA 序列号（0x80000001）。
pub const INITIAL_SEQUENCE_NUMBER: i32 = 0x8000_0001_u32 as i32;
/// 默认参考带宽：100 Mbps。
pub const DEFAULT_REFERENCE_BANDWIDTH: u64 = 100_000_000;
/// AllSPFRouters 组播地址（v2）。
pub const ALL_SPF_ROUTERS_V4: IpAddress = IpAddress::new(224, 0, 0, 5);
