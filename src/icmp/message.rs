//! ICMP 报文编码
//!
//! 8 字节回显报文：type/code/checksum/identifier/sequence。

use crate::net::{internet_checksum, CodecError};

/// ICMP 回显报文（仅建模 Echo Request/Reply 两种类型）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IcmpMessage {
    EchoRequest { ident: u16, seq: u16 },
    EchoReply { ident: u16, seq: u16 },
}

const TYPE_ECHO_REQUEST: u8 = 8;
const TYPE_ECHO_REPLY: u8 = 0;

impl IcmpMessage {
    pub fn to_bytes(&self) -> Vec<u8> {
        let (typ, ident, seq) = match self {
            IcmpMessage::EchoRequest { ident, seq } => (TYPE_ECHO_REQUEST, *ident, *seq),
            IcmpMessage::EchoReply { ident, seq } => (TYPE_ECHO_REPLY, *ident, *seq),
        };
        let mut buf = vec![typ, 0, 0, 0];
        buf.extend_from_slice(&ident.to_be_bytes());
        buf.extend_from_slice(&seq.to_be_bytes());
        let ck = internet_checksum(&buf);
        buf[2..4].copy_from_slice(&ck.to_be_bytes());
        buf
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<IcmpMessage, CodecError> {
        if bytes.len() < 8 {
            return Err(CodecError::Truncated);
        }
        if bytes[1] != 0 {
            return Err(CodecError::Unsupported);
        }
        let ident = u16::from_be_bytes([bytes[4], bytes[5]]);
        let seq = u16::from_be_bytes([bytes[6], bytes[7]]);
        match bytes[0] {
            TYPE_ECHO_REQUEST => Ok(IcmpMessage::EchoRequest { ident, seq }),
            TYPE_ECHO_REPLY => Ok(IcmpMessage::EchoReply { ident, seq }),
            _ => Err(CodecError::Unsupported),
        }
    }
}
