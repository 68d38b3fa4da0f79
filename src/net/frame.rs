//! 以太网帧
//!
//! 源/目的 MAC、EtherType 与载荷。编码时载荷不足 46 字节按标准
//! 以太网最小帧补零；`to_bytes`/`from_bytes` 按字节精确往返。

use crate::addr::MacAddress;
use thiserror::Error;

/// 以太网最小载荷长度。
pub const MIN_PAYLOAD: usize = 46;

/// 报文编解码错误。
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("truncated packet")]
    Truncated,
    #[error("bad version or header length")]
    BadHeader,
    #[error("checksum mismatch")]
    BadChecksum,
    #[error("unsupported message")]
    Unsupported,
}

/// EtherType：帧内载荷的协议类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EtherType {
    Arp,
    Ipv4,
    Ipv6,
    Other(u16),
}

impl EtherType {
    pub fn to_u16(self) -> u16 {
        match self {
            EtherType::Arp => 0x0806,
            EtherType::Ipv4 => 0x0800,
            EtherType::Ipv6 => 0x86DD,
            EtherType::Other(v) => v,
        }
    }

    pub fn from_u16(v: u16) -> EtherType {
        match v {
            0x0806 => EtherType::Arp,
            0x0800 => EtherType::Ipv4,
            0x86DD => EtherType::Ipv6,
            other => EtherType::Other(other),
        }
    }
}

/// 以太网帧
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EthernetFrame {
    pub dst: MacAddress,
    pub src: MacAddress,
    pub ethertype: EtherType,
    pub payload: Vec<u8>,
}

impl EthernetFrame {
    pub fn new(
        src: MacAddress,
        dst: MacAddress,
        ethertype: EtherType,
        payload: Vec<u8>,
    ) -> EthernetFrame {
        EthernetFrame {
            dst,
            src,
            ethertype,
            payload,
        }
    }

    /// 编码：目的 MAC(6) + 源 MAC(6) + EtherType(2) + 载荷（补齐到 46）。
    pub fn to_bytes(&self) -> Vec<u8> {
        let payload_len = self.payload.len().max(MIN_PAYLOAD);
        let mut buf = Vec::with_capacity(14 + payload_len);
        buf.extend_from_slice(&self.dst.to_bytes());
        buf.extend_from_slice(&self.src.to_bytes());
        buf.extend_from_slice(&self.ethertype.to_u16().to_be_bytes());
        buf.extend_from_slice(&self.payload);
        buf.resize(14 + payload_len, 0);
        buf
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<EthernetFrame, CodecError> {
        if bytes.len() < 14 {
            return Err(CodecError::Truncated);
        }
        let mut dst = [0u8; 6];
        let mut src = [0u8; 6];
        dst.copy_from_slice(&bytes[0..6]);
        src.copy_from_slice(&bytes[6..12]);
        let ethertype = EtherType::from_u16(u16::from_be_bytes([bytes[12], bytes[13]]));
        Ok(EthernetFrame {
            dst: MacAddress::from_bytes(dst),
            src: MacAddress::from_bytes(src),
            ethertype,
            payload: bytes[14..].to_vec(),
        })
    }
}
