//! Link-State Advertisements.
//!
//! LSAs are identified by `(lsType, linkStateId, advertisingRouter)` within
//! an area; `LsaKey` is that triple as a struct map key. Link and network
//! identifiers stay as raw `u32` words as advertised on the wire.

use super::types::RouterId;
use crate::addr::{IpAddress, SubnetMask};
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum LsType {
    Router = 1,
    Network = 2,
    Summary = 3,
    AsbrSummary = 4,
    External = 5,
}

/// LSDB key: the identifying triple of an LSA.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct LsaKey {
    pub ls_type: LsType,
    pub link_state_id: u32,
    pub advertising_router: RouterId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LsaHeader {
    /// Age in seconds; flushed from the database at `OSPF_MAX_AGE`.
    pub age: u16,
    pub ls_type: LsType,
    pub link_state_id: u32,
    pub advertising_router: RouterId,
    pub sequence: i32,
}

impl LsaHeader {
    pub fn key(&self) -> LsaKey {
        LsaKey {
            ls_type: self.ls_type,
            link_state_id: self.link_state_id,
            advertising_router: self.advertising_router,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lsa {
    pub header: LsaHeader,
    pub body: LsaBody,
}

impl Lsa {
    pub fn key(&self) -> LsaKey {
        self.header.key()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LsaBody {
    Router(RouterLsa),
    Network(NetworkLsa),
    Summary(SummaryLsa),
    External(ExternalLsa),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouterLinkKind {
    /// Link to another router (link id = neighbor router id).
    PointToPoint,
    /// Link to a transit network (link id = DR interface address).
    Transit,
    /// Stub network (link id = network, link data = mask).
    Stub,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterLink {
    pub kind: RouterLinkKind,
    pub link_id: u32,
    pub link_data: u32,
    pub metric: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterLsa {
    pub links: Vec<RouterLink>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkLsa {
    pub mask: SubnetMask,
    pub attached: Vec<RouterId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryLsa {
    pub mask: SubnetMask,
    pub metric: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalLsa {
    pub mask: SubnetMask,
    pub metric: u32,
    pub forwarding: IpAddress,
}
