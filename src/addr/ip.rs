//! IPv4 地址
//!
//! 四个八位组，构造时逐项校验 0-255。支持与掩码按位与、CIDR 解析。

use super::error::AddrError;
use super::mask::SubnetMask;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// IPv4 地址（不可变值类型）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IpAddress([u8; 4]);

impl IpAddress {
    /// 0.0.0.0
    pub const UNSPECIFIED: IpAddress = IpAddress([0, 0, 0, 0]);

    pub const fn new(a: u8, b: u8, c: u8, d: u8) -> IpAddress {
        IpAddress([a, b, c, d])
    }

    /// 解析点分十进制字符串；格式或取值非法返回 `AddrError`。
    pub fn parse(s: &str) -> Result<IpAddress, AddrError> {
        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() != 4 {
            return Err(AddrError::InvalidIp(s.to_string()));
        }
        let mut octets = [0u8; 4];
        for (i, part) in parts.iter().enumerate() {
            if part.is_empty() || part.len() > 3 || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(AddrError::InvalidIp(s.to_string()));
            }
            // 逐项校验 0-255，拒绝 256 等越界取值
            octets[i] = part
                .parse::<u16>()
                .ok()
                .filter(|v| *v <= 255)
                .map(|v| v as u8)
                .ok_or_else(|| AddrError::InvalidIp(s.to_string()))?;
        }
        Ok(IpAddress(octets))
    }

    /// 解析 CIDR 记法 `a.b.c.d/n`。
    pub fn parse_cidr(s: &str) -> Result<(IpAddress, SubnetMask), AddrError> {
        let (ip_part, len_part) = s
            .split_once('/')
            .ok_or_else(|| AddrError::InvalidCidr(s.to_string()))?;
        let ip = IpAddress::parse(ip_part).map_err(|_| AddrError::InvalidCidr(s.to_string()))?;
        let len: u32 = len_part
            .parse()
            .map_err(|_| AddrError::InvalidCidr(s.to_string()))?;
        let mask = SubnetMask::from_prefix_len(len)
            .map_err(|_| AddrError::InvalidCidr(s.to_string()))?;
        Ok((ip, mask))
    }

    pub fn octets(&self) -> [u8; 4] {
        self.0
    }

    pub fn to_u32(&self) -> u32 {
        u32::from_be_bytes(self.0)
    }

    pub fn from_u32(v: u32) -> IpAddress {
        IpAddress(v.to_be_bytes())
    }

    /// 与掩码按位与，得到网络地址。
    pub fn mask_with(&self, mask: &SubnetMask) -> IpAddress {
        IpAddress::from_u32(self.to_u32() & mask.to_u32())
    }

    /// 判断与 `other` 是否处于同一子网。
    pub fn same_subnet(&self, other: &IpAddress, mask: &SubnetMask) -> bool {
        self.mask_with(mask) == other.mask_with(mask)
    }

    pub fn is_unspecified(&self) -> bool {
        self.0 == [0, 0, 0, 0]
    }
}

impl fmt::Display for IpAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.0;
        write!(f, "{a}.{b}.{c}.{d}")
    }
}

impl FromStr for IpAddress {
    type Err = AddrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IpAddress::parse(s)
    }
}
