//! 地址解析错误

use thiserror::Error;

/// 地址/掩码字符串校验失败。
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddrError {
    #[error("invalid IPv4 address: {0}")]
    InvalidIp(String),
    #[error("invalid subnet mask: {0}")]
    InvalidMask(String),
    #[error("invalid prefix length: {0}")]
    InvalidPrefixLen(u32),
    #[error("invalid MAC address: {0}")]
    InvalidMac(String),
    #[error("invalid CIDR notation: {0}")]
    InvalidCidr(String),
}
