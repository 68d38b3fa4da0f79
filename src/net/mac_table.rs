//! 交换机 MAC 地址表
//!
//! (MAC, VLAN) → 端口。硬性不变式：同一 VLAN 内一个 MAC 同一时间
//! 只映射到一个端口——学习即替换。静态条目不被动态学习覆盖。

use crate::addr::MacAddress;
use crate::sim::SimTime;
use std::collections::HashMap;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacEntryKind {
    Dynamic,
    Static,
}

#[derive(Debug, Clone, Copy)]
pub struct MacTableEntry {
    pub port: usize,
    pub learned_at: SimTime,
    pub kind: MacEntryKind,
}

#[derive(Debug, Default, Clone)]
pub struct MacTable {
    entries: HashMap<(MacAddress, u16), MacTableEntry>,
}

impl MacTable {
    pub fn new() -> MacTable {
        MacTable::default()
    }

    /// 入帧学习：刷新或迁移 (MAC, VLAN) 的端口映射。
    pub fn learn(&mut self, mac: MacAddress, vlan: u16, port: usize, now: SimTime) {
        if let Some(existing) = self.entries.get(&(mac, vlan)) {
            if existing.kind == MacEntryKind::Static {
                return;
            }
        }
        trace!(mac = %mac, vlan, port, "学习 MAC 条目");
        self.entries.insert(
            (mac, vlan),
            MacTableEntry {
                port,
                learned_at: now,
                kind: MacEntryKind::Dynamic,
            },
        );
    }

    pub fn add_static(&mut self, mac: MacAddress, vlan: u16, port: usize) {
        self.entries.insert(
            (mac, vlan),
            MacTableEntry {
                port,
                learned_at: SimTime::ZERO,
                kind: MacEntryKind::Static,
            },
        );
    }

    /// 丢弃全部动态条目（断电/清表）。
    pub fn clear_dynamic(&mut self) {
        self.entries.retain(|_, e| e.kind == MacEntryKind::Static);
    }

    pub fn lookup(&self, mac: &MacAddress, vlan: u16) -> Option<&MacTableEntry> {
        self.entries.get(&(*mac, vlan))
    }

    pub fn entries(&self) -> impl Iterator<Item = (&(MacAddress, u16), &MacTableEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
