//! 链路状态数据库
//!
//! 按区域存放 LSA（结构体三元组为键），外部 LSA 单独存放。
//! `install` 按键插入或替换；老化由 `age_all` 推进，到达
//! `OSPF_MAX_AGE` 的 LSA 被冲刷并报告给调用方。

use super::lsa::{Lsa, LsaHeader, LsaKey};
use super::types::{AreaId, OSPF_MAX_AGE};
use std::collections::BTreeMap;
use tracing::{debug, trace};

#[derive(Debug, Default)]
pub struct Lsdb {
    areas: BTreeMap<AreaId, BTreeMap<LsaKey, Lsa>>,
    externals: BTreeMap<LsaKey, Lsa>,
}

impl Lsdb {
    pub fn new() -> Lsdb {
        Lsdb::default()
    }

    /// 插入或按键替换；返回被替换 LSA 的序列号。
    pub fn install(&mut self, area: AreaId, lsa: Lsa) -> Option<i32> {
        let key = lsa.key();
        trace!(%area, ?key, seq = lsa.header.sequence, "安装 LSA");
        self.areas
            .entry(area)
            .or_default()
            .insert(key, lsa)
            .map(|old| old.header.sequence)
    }

    pub fn install_external(&mut self, lsa: Lsa) -> Option<i32> {
        let key = lsa.key();
        self.externals.insert(key, lsa).map(|old| old.header.sequence)
    }

    pub fn get(&self, area: AreaId, key: &LsaKey) -> Option<&Lsa> {
        self.areas.get(&area)?.get(key)
    }

    pub fn remove(&mut self, area: AreaId, key: &LsaKey) -> Option<Lsa> {
        self.areas.get_mut(&area)?.remove(key)
    }

    /// 某区域全部 LSA 首部。
    pub fn headers(&self, area: AreaId) -> Vec<LsaHeader> {
        self.areas
            .get(&area)
            .map(|m| m.values().map(|l| l.header).collect())
            .unwrap_or_default()
    }

    pub fn area_lsas(&self, area: AreaId) -> impl Iterator<Item = &Lsa> {
        self.areas.get(&area).into_iter().flat_map(|m| m.values())
    }

    pub fn externals(&self) -> impl Iterator<Item = &Lsa> {
        self.externals.values()
    }

    pub fn areas(&self) -> impl Iterator<Item = AreaId> + '_ {
        self.areas.keys().copied()
    }

    /// 全库 LSA 总数（含外部）。
    pub fn count(&self) -> usize {
        self.areas.values().map(|m| m.len()).sum::<usize>() + self.externals.len()
    }

    /// 推进全部 LSA 年龄；返回到龄被冲刷的键。
    pub fn age_all(&mut self, delta_secs: u16) -> Vec<(AreaId, LsaKey)> {
        let mut flushed = Vec::new();
        for (area, lsas) in &mut self.areas {
            let mut dead = Vec::new();
            for (key, lsa) in lsas.iter_mut() {
                lsa.header.age = lsa.header.age.saturating_add(delta_secs);
                if lsa.header.age >= OSPF_MAX_AGE {
                    dead.push(*key);
                }
            }
            for key in dead {
                debug!(%area, ?key, "LSA 到达最大寿命，冲刷");
                lsas.remove(&key);
                flushed.push((*area, key));
            }
        }
        flushed
    }
}
