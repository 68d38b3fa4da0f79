//! 网络模拟模块
//!
//! 物理连接与帧转发的核心组件：端口、线缆、以太网帧、IPv4 报文、
//! 设备（PC/集线器/交换机/路由器）与网络拓扑。

// 子模块声明
mod arp;
mod cable;
mod deliver_frame;
mod device;
mod events;
mod frame;
mod host;
mod hub;
mod id;
mod ipv4;
mod mac_table;
mod net_world;
mod network;
mod router;
mod stats;
mod switch;

// 重新导出公共接口
pub use arp::ArpTable;
pub use cable::Cable;
pub use deliver_frame::DeliverFrame;
pub use device::{Device, DeviceCore, DeviceKind};
pub use events::{DeviceTick, StartPing};
pub use frame::{CodecError, EtherType, EthernetFrame, MIN_PAYLOAD};
pub use host::{Host, PingLaunch};
pub use hub::Hub;
pub use id::{CableId, DeviceId, PortRef};
pub use ipv4::{internet_checksum, Ipv4Packet, PROTO_ICMP, PROTO_OSPF};
pub use mac_table::{MacEntryKind, MacTable, MacTableEntry};
pub use net_world::NetWorld;
pub use network::{Network, TxResult};
pub use router::{DeviceError, DropEvent, DropReason, ForwardEvent, ForwardStats, Router};
pub use stats::NetworkStats;
pub use switch::{Switch, SwitchStats};

pub use cable::Port;
