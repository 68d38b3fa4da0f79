//! ICMP 回显服务
//!
//! ping 的底层机制：回显请求/应答关联、RTT 测量、超时检测。

mod message;
mod service;

pub use message::IcmpMessage;
pub use service::{
    EchoHandle, EchoReplyEvent, EchoStats, EchoTimeoutEvent, IcmpService, PendingEcho,
    DEFAULT_ECHO_TIMEOUT,
};
