//! MAC 地址
//!
//! 六字节硬件地址。解析接受 `:` 或 `-` 分隔、大小写不敏感；
//! 相等性按字节比较，与书写格式无关。

use super::error::AddrError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// MAC 地址（不可变值类型）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    /// FF:FF:FF:FF:FF:FF
    pub const BROADCAST: MacAddress = MacAddress([0xFF; 6]);

    pub const fn new(bytes: [u8; 6]) -> MacAddress {
        MacAddress(bytes)
    }

    /// 解析 `aa:bb:cc:dd:ee:ff` 或 `AA-BB-CC-DD-EE-FF`。
    pub fn parse(s: &str) -> Result<MacAddress, AddrError> {
        let sep = if s.contains('-') { '-' } else { ':' };
        let parts: Vec<&str> = s.split(sep).collect();
        if parts.len() != 6 {
            return Err(AddrError::InvalidMac(s.to_string()));
        }
        let mut bytes = [0u8; 6];
        for (i, part) in parts.iter().enumerate() {
            if part.len() != 2 {
                return Err(AddrError::InvalidMac(s.to_string()));
            }
            bytes[i] = u8::from_str_radix(part, 16)
                .map_err(|_| AddrError::InvalidMac(s.to_string()))?;
        }
        Ok(MacAddress(bytes))
    }

    pub fn is_broadcast(&self) -> bool {
        self.0 == [0xFF; 6]
    }

    /// 组播：首字节最低位为 1（广播是其特例）。
    pub fn is_multicast(&self) -> bool {
        self.0[0] & 0x01 != 0
    }

    pub fn to_bytes(&self) -> [u8; 6] {
        self.0
    }

    pub fn from_bytes(bytes: [u8; 6]) -> MacAddress {
        MacAddress(bytes)
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            b[0], b[1], b[2], b[3], b[4], b[5]
        )
    }
}

impl FromStr for MacAddress {
    type Err = AddrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MacAddress::parse(s)
    }
}
