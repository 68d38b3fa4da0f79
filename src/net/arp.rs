//! ARP 表
//!
//! IP 到 MAC 的映射，手工播种（本层不建模老化与动态解析）。

use crate::addr::{IpAddress, MacAddress};
use std::collections::HashMap;

#[derive(Debug, Default, Clone)]
pub struct ArpTable {
    entries: HashMap<IpAddress, MacAddress>,
}

impl ArpTable {
    pub fn new() -> ArpTable {
        ArpTable::default()
    }

    pub fn add(&mut self, ip: IpAddress, mac: MacAddress) {
        self.entries.insert(ip, mac);
    }

    pub fn lookup(&self, ip: &IpAddress) -> Option<MacAddress> {
        self.entries.get(ip).copied()
    }

    pub fn remove(&mut self, ip: &IpAddress) -> Option<MacAddress> {
        self.entries.remove(ip)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&IpAddress, &MacAddress)> {
        self.entries.iter()
    }
}
