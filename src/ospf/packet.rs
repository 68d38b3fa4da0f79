//! OSPF 报文
//!
//! 报文是结构化值对象（仿真中经 serde 承载），不要求线上位布局。
//! 公共首部：版本、路由器标识、区域标识。

use super::lsa::{Lsa, LsaHeader};
use super::types::{AreaId, OspfVersion, RouterId};
use crate::addr::SubnetMask;
use serde::{Deserialize, Serialize};

/// OSPF 报文（公共首部 + 报文体）。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OspfPacket {
    pub version: OspfVersion,
    pub router_id: RouterId,
    pub area_id: AreaId,
    pub body: OspfBody,
}

impl OspfPacket {
    /// 报文类型名（日志用）。
    pub fn kind(&self) -> &'static str {
        match self.body {
            OspfBody::Hello(_) => "Hello",
            OspfBody::DatabaseDescription(_) => "DatabaseDescription",
            OspfBody::LinkStateUpdate(_) => "LinkStateUpdate",
            OspfBody::LinkStateAck(_) => "LinkStateAck",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OspfBody {
    Hello(HelloPacket),
    DatabaseDescription(DdPacket),
    LinkStateUpdate(LsuPacket),
    LinkStateAck(AckPacket),
}

/// Hello 报文。v2 携带网络掩码，v3 以接口标识代替。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloPacket {
    pub network_mask: Option<SubnetMask>,
    pub interface_id: Option<u32>,
    pub hello_interval: u16,
    pub dead_interval: u32,
    pub priority: u8,
    pub dr: RouterId,
    pub bdr: RouterId,
    /// 本接口上已看到的邻居。
    pub neighbors: Vec<RouterId>,
}

/// 数据库描述报文（简化：一次携带全部首部）。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DdPacket {
    pub dd_seq: u32,
    pub headers: Vec<LsaHeader>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LsuPacket {
    pub lsas: Vec<Lsa>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckPacket {
    pub headers: Vec<LsaHeader>,
}
