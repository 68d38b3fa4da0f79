//! 地址值类型模块
//!
//! IPv4 地址、子网掩码与 MAC 地址：不可变、构造时校验、可比较。
//! 非法字符串在构造时抛出类型化错误，绝不静默纠正。

mod error;
mod ip;
mod mac;
mod mask;

pub use error::AddrError;
pub use ip::IpAddress;
pub use mac::MacAddress;
pub use mask::SubnetMask;
