//! OSPF 协议引擎
//!
//! 每接口 Hello 协议、邻居状态机、DR/BDR 选举、LSA 始发/泛洪、
//! LSDB 与 Dijkstra SPF 计算。引擎通过 `set_send_callback` 发出
//! 报文，与任何实际传输解耦；时间一律由调用方注入（仿真时钟）。
//! 支持 OSPFv2 与 OSPFv3 两个变体。

mod config;
mod engine;
mod interface;
mod lsa;
mod lsdb;
mod neighbor;
mod packet;
mod spf;
mod types;

pub use config::{AreaType, NetworkBinding, OspfConfig};
pub use engine::{OspfError, OspfProcess, SendCallback};
pub use interface::{InterfaceOpts, InterfaceState, OspfInterface, OspfNetworkType};
pub use lsa::{
    ExternalLsa, Lsa, LsaBody, LsaHeader, LsaKey, LsType, NetworkLsa, RouterLink, RouterLinkKind,
    RouterLsa, SummaryLsa,
};
pub use lsdb::Lsdb;
pub use neighbor::{NeighborState, OspfNeighbor};
pub use packet::{AckPacket, DdPacket, HelloPacket, LsuPacket, OspfBody, OspfPacket};
pub use spf::{FirstHop, SpfRoute, SpfRouteKind};
pub use types::{
    AreaId, OspfDest, OspfVersion, RouterId, ALL_SPF_ROUTERS_V4, DEAD_INTERVAL,
    DEFAULT_REFERENCE_BANDWIDTH, HELLO_INTERVAL, INITIAL_SEQUENCE_NUMBER, LS_REFRESH_TIME,
    OSPF_MAX_AGE,
};
