//! 子网掩码
//!
//! 内部仅保存前缀长度（0-32）；点分十进制输入必须是连续的 1，
//! 否则构造失败。LPM 以前缀长度比较。

use super::error::AddrError;
use super::ip::IpAddress;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 子网掩码（以前缀长度表示）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubnetMask(u8);

impl SubnetMask {
    /// 由前缀长度构造（0-32）。
    pub fn from_prefix_len(len: u32) -> Result<SubnetMask, AddrError> {
        if len > 32 {
            return Err(AddrError::InvalidPrefixLen(len));
        }
        Ok(SubnetMask(len as u8))
    }

    /// 解析点分十进制掩码；非连续掩码（如 255.0.255.0）拒绝。
    pub fn parse(s: &str) -> Result<SubnetMask, AddrError> {
        let ip = IpAddress::parse(s).map_err(|_| AddrError::InvalidMask(s.to_string()))?;
        let v = ip.to_u32();
        let ones = v.count_ones();
        // 连续掩码满足：左移 ones 位后为 0
        if ones < 32 && (v << ones) != 0 {
            return Err(AddrError::InvalidMask(s.to_string()));
        }
        Ok(SubnetMask(ones as u8))
    }

    /// 兼容两种写法：`24` / `255.255.255.0`。
    pub fn parse_any(s: &str) -> Result<SubnetMask, AddrError> {
        if let Ok(len) = s.parse::<u32>() {
            return SubnetMask::from_prefix_len(len);
        }
        SubnetMask::parse(s)
    }

    /// 由掩码位图构造（按置 1 位数计；来源需保证连续）。
    pub fn from_bits(bits: u32) -> SubnetMask {
        SubnetMask(bits.count_ones() as u8)
    }

    pub fn prefix_len(&self) -> u8 {
        self.0
    }

    pub fn to_u32(&self) -> u32 {
        if self.0 == 0 {
            0
        } else {
            u32::MAX << (32 - self.0 as u32)
        }
    }

    pub fn to_ip(&self) -> IpAddress {
        IpAddress::from_u32(self.to_u32())
    }
}

impl fmt::Display for SubnetMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_ip())
    }
}

impl FromStr for SubnetMask {
    type Err = AddrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SubnetMask::parse_any(s)
    }
}
