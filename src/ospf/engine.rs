//! OSPF 进程
//!
//! 把接口、邻居状态机、LSDB 与 SPF 组装成一个协议引擎。报文只
//! 通过发送回调离开引擎；所有定时行为由 `tick(now)` 驱动，时间
//! 完全由调用方注入。
//!
//! 简化的邻接推进（点到点同样适用）：
//! 双向可达 → ExStart（双方各发一个 DatabaseDescription）→
//! 收到 DD 进入 Exchange 并以 LinkStateUpdate 交换全库 →
//! 收到 LSU 安装后直接 Full（无未决请求时跳过 Loading）。

use super::config::{AreaType, OspfConfig};
use super::interface::{InterfaceOpts, InterfaceState, OspfInterface, OspfNetworkType};
use super::lsa::{
    Lsa, LsaBody, LsaHeader, LsaKey, LsType, NetworkLsa, RouterLink, RouterLinkKind, RouterLsa,
};
use super::lsdb::Lsdb;
use super::neighbor::{NeighborState, OspfNeighbor};
use super::packet::{AckPacket, DdPacket, HelloPacket, LsuPacket, OspfBody, OspfPacket};
use super::spf::{self, FirstHop, SpfRoute};
use super::types::{
    AreaId, OspfDest, OspfVersion, RouterId, INITIAL_SEQUENCE_NUMBER, LS_REFRESH_TIME,
};
use crate::addr::{IpAddress, SubnetMask};
use crate::sim::SimTime;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use tracing::{debug, info, trace};

/// 发送回调：报文离开引擎的唯一通道。
pub type SendCallback = Box<dyn FnMut(&str, &OspfPacket, OspfDest) + Send>;

/// 引擎配置错误。
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OspfError {
    #[error("no area binding for interface {0}")]
    NoArea(String),
    #[error("interface already activated: {0}")]
    AlreadyActive(String),
}

type Outgoing = (String, OspfPacket, OspfDest);

pub struct OspfProcess {
    config: OspfConfig,
    interfaces: BTreeMap<String, OspfInterface>,
    lsdb: Lsdb,
    send_cb: Option<SendCallback>,
    dd_seq: u32,
    next_interface_id: u32,
    last_aged: SimTime,
    spf_dirty: bool,
}

impl OspfProcess {
    pub fn new(router_id: RouterId, version: OspfVersion) -> OspfProcess {
        OspfProcess {
            config: OspfConfig::new(router_id, version),
            interfaces: BTreeMap::new(),
            lsdb: Lsdb::new(),
            send_cb: None,
            dd_seq: 1,
            next_interface_id: 1,
            last_aged: SimTime::ZERO,
            spf_dirty: false,
        }
    }

    pub fn router_id(&self) -> RouterId {
        self.config.router_id
    }

    pub fn version(&self) -> OspfVersion {
        self.config.version
    }

    pub fn config(&self) -> &OspfConfig {
        &self.config
    }

    // ---- 配置 ----

    pub fn add_network(&mut self, network: IpAddress, wildcard: IpAddress, area: AreaId) {
        self.config.add_network(network, wildcard, area);
    }

    pub fn set_passive_interface(&mut self, iface: &str) {
        self.config.set_passive(iface);
        if let Some(ifc) = self.interfaces.get_mut(iface) {
            ifc.passive = true;
        }
    }

    pub fn set_area_type(&mut self, area: AreaId, t: AreaType) {
        self.config.set_area_type(area, t);
    }

    pub fn set_reference_bandwidth(&mut self, bandwidth_bps: u64) {
        self.config.reference_bandwidth = bandwidth_bps;
    }

    pub fn set_send_callback(&mut self, cb: SendCallback) {
        self.send_cb = Some(cb);
    }

    // ---- 接口生命周期 ----

    /// 激活接口。区域取显式参数，否则按 network 语句匹配。
    /// 激活即始发 Router-LSA，非被动接口立即发出首个 Hello。
    pub fn activate_interface(
        &mut self,
        name: &str,
        ip: IpAddress,
        mask: SubnetMask,
        area: Option<AreaId>,
        opts: InterfaceOpts,
        now: SimTime,
    ) -> Result<(), OspfError> {
        if self.interfaces.contains_key(name) {
            return Err(OspfError::AlreadyActive(name.to_string()));
        }
        let area = area
            .or_else(|| self.config.area_for(ip))
            .ok_or_else(|| OspfError::NoArea(name.to_string()))?;
        let cost = opts
            .cost
            .unwrap_or_else(|| self.config.cost_for_bandwidth(opts.bandwidth_bps));
        let mut opts = opts;
        opts.passive = opts.passive || self.config.is_passive(name);
        let interface_id = self.next_interface_id;
        self.next_interface_id += 1;
        let ifc = OspfInterface::new(name, ip, mask, area, interface_id, cost, &opts, now);
        info!(iface = name, %ip, %area, state = %ifc.state, "OSPF 接口激活");
        self.interfaces.insert(name.to_string(), ifc);

        self.originate_router_lsas(now);
        self.spf_dirty = true;

        if !self.interfaces[name].passive {
            let hello = self.build_hello(name);
            let ifc = self.interfaces.get_mut(name).expect("just inserted");
            let interval = SimTime::from_secs(ifc.hello_interval as u64);
            ifc.next_hello_at = now.saturating_add(interval);
            self.emit(name, hello, OspfDest::AllSpfRouters);
        }
        Ok(())
    }

    /// 去激活接口：移除接口与其邻居并重新始发。
    pub fn deactivate_interface(&mut self, name: &str, now: SimTime) {
        if self.interfaces.remove(name).is_some() {
            info!(iface = name, "OSPF 接口去激活");
            self.originate_router_lsas(now);
            self.spf_dirty = true;
        }
    }

    pub fn interface(&self, name: &str) -> Option<&OspfInterface> {
        self.interfaces.get(name)
    }

    pub fn interfaces(&self) -> impl Iterator<Item = &OspfInterface> {
        self.interfaces.values()
    }

    /// 显式 KillNbr：邻居立即回到 Down，但保留到下次清理。
    pub fn kill_neighbor(&mut self, iface: &str, rid: RouterId) {
        let mut changed = false;
        if let Some(ifc) = self.interfaces.get_mut(iface) {
            if let Some(nbr) = ifc.neighbors.get_mut(&rid) {
                info!(iface, %rid, "KillNbr：邻居置为 Down");
                changed = nbr.state >= NeighborState::ExStart;
                nbr.state = NeighborState::Down;
            }
        }
        if changed {
            self.spf_dirty = true;
        }
    }

    // ---- LSDB 访问 ----

    pub fn install_lsa(&mut self, area: AreaId, lsa: Lsa) {
        if matches!(lsa.body, LsaBody::External(_)) {
            self.lsdb.install_external(lsa);
        } else {
            self.lsdb.install(area, lsa);
        }
        self.spf_dirty = true;
    }

    pub fn lsdb(&self) -> &Lsdb {
        &self.lsdb
    }

    pub fn lsdb_headers(&self, area: AreaId) -> Vec<LsaHeader> {
        self.lsdb.headers(area)
    }

    pub fn lsdb_count(&self) -> usize {
        self.lsdb.count()
    }

    pub fn take_spf_dirty(&mut self) -> bool {
        std::mem::take(&mut self.spf_dirty)
    }

    // ---- 报文处理 ----

    /// 处理一个到达的 OSPF 报文。版本不符与自身回环报文静默忽略。
    #[tracing::instrument(skip(self, packet, src), fields(src = %src, kind = packet.kind()))]
    pub fn process_packet(
        &mut self,
        iface: &str,
        src: IpAddress,
        packet: &OspfPacket,
        now: SimTime,
    ) {
        if packet.version != self.config.version {
            trace!("版本不匹配，忽略");
            return;
        }
        if packet.router_id == self.config.router_id {
            trace!("收到自身路由器标识的报文，忽略");
            return;
        }
        match &packet.body {
            OspfBody::Hello(h) => self.process_hello(iface, src, packet, h, now),
            OspfBody::DatabaseDescription(dd) => self.process_dd(iface, packet, dd),
            OspfBody::LinkStateUpdate(lsu) => self.process_lsu(iface, packet, lsu, now),
            OspfBody::LinkStateAck(ack) => {
                trace!(acked = ack.headers.len(), "收到 LSAck");
            }
        }
    }

    fn process_hello(
        &mut self,
        iface: &str,
        src: IpAddress,
        packet: &OspfPacket,
        hello: &HelloPacket,
        now: SimTime,
    ) {
        let self_rid = self.config.router_id;
        let version = self.config.version;
        let sender = packet.router_id;
        let mut out: Vec<Outgoing> = Vec::new();
        let mut adjacency_changed = false;

        {
            let Some(ifc) = self.interfaces.get_mut(iface) else {
                trace!(iface, "接口未激活，丢弃 Hello");
                return;
            };
            if ifc.passive || ifc.state == InterfaceState::Down {
                return;
            }
            if packet.area_id != ifc.area {
                debug!(iface, got = %packet.area_id, want = %ifc.area, "区域不匹配，拒绝 Hello");
                return;
            }
            // 参数不匹配：静默拒绝，不创建也不改变邻居状态
            if hello.hello_interval != ifc.hello_interval
                || hello.dead_interval != ifc.dead_interval
            {
                debug!(iface, "Hello/失效间隔不匹配，拒绝 Hello");
                return;
            }
            // v2 在广播网络上校验掩码；v3 的 Hello 不携带掩码
            if version == OspfVersion::V2
                && ifc.network_type == OspfNetworkType::Broadcast
                && hello.network_mask.is_some_and(|m| m != ifc.mask)
            {
                debug!(iface, "网络掩码不匹配，拒绝 Hello");
                return;
            }

            let nbr = ifc
                .neighbors
                .entry(sender)
                .or_insert_with(|| OspfNeighbor::new(sender, src, now));
            let prev = nbr.state;
            nbr.last_hello = now;
            nbr.address = src;
            nbr.priority = hello.priority;
            nbr.dr = hello.dr;
            nbr.bdr = hello.bdr;
            if nbr.state == NeighborState::Down {
                nbr.state = NeighborState::Init;
            }

            let sees_us = hello.neighbors.contains(&self_rid);
            match ifc.network_type {
                OspfNetworkType::PointToPoint | OspfNetworkType::PointToMultipoint => {
                    if sees_us && nbr.state < NeighborState::ExStart {
                        // 双向可达：点到点直接进入 ExStart 形成邻接
                        nbr.state = NeighborState::ExStart;
                        adjacency_changed = true;
                        out.push((
                            iface.to_string(),
                            OspfPacket {
                                version,
                                router_id: self_rid,
                                area_id: ifc.area,
                                body: OspfBody::DatabaseDescription(DdPacket {
                                    dd_seq: self.dd_seq,
                                    headers: Vec::new(),
                                }),
                            },
                            OspfDest::Unicast(src),
                        ));
                        self.dd_seq = self.dd_seq.wrapping_add(1);
                    } else if !sees_us && nbr.state >= NeighborState::TwoWay {
                        // OneWay：对端不再列出我们
                        nbr.state = NeighborState::Init;
                        adjacency_changed = true;
                    }
                }
                OspfNetworkType::Broadcast => {
                    let mut reeval = false;
                    if sees_us && nbr.state == NeighborState::Init {
                        nbr.state = NeighborState::TwoWay;
                        reeval = true;
                    } else if !sees_us && nbr.state >= NeighborState::TwoWay {
                        nbr.state = NeighborState::Init;
                        adjacency_changed = true;
                        reeval = true;
                    }
                    // 等待定时器结束后，新邻居达到双向即重新选举
                    if reeval && ifc.wait_until.is_none() && ifc.state != InterfaceState::Waiting
                    {
                        ifc.run_election(self_rid);
                        let dr = ifc.dr;
                        let bdr = ifc.bdr;
                        let we_are_dr = dr == self_rid || bdr == self_rid;
                        for (rid, n) in ifc.neighbors.iter_mut() {
                            if n.state == NeighborState::TwoWay
                                && (we_are_dr || *rid == dr || *rid == bdr)
                            {
                                n.state = NeighborState::ExStart;
                                adjacency_changed = true;
                                out.push((
                                    iface.to_string(),
                                    OspfPacket {
                                        version,
                                        router_id: self_rid,
                                        area_id: ifc.area,
                                        body: OspfBody::DatabaseDescription(DdPacket {
                                            dd_seq: self.dd_seq,
                                            headers: Vec::new(),
                                        }),
                                    },
                                    OspfDest::Unicast(n.address),
                                ));
                                self.dd_seq = self.dd_seq.wrapping_add(1);
                            }
                        }
                    }
                }
            }

            let cur = ifc.neighbors.get(&sender).map(|n| n.state);
            if cur != Some(prev) {
                debug!(iface, %sender, from = %prev, to = %cur.expect("neighbor exists"), "邻居状态迁移");
            }
        }

        for (ifn, pkt, dest) in out {
            self.emit(&ifn, pkt, dest);
        }
        if adjacency_changed {
            self.originate_router_lsas(now);
            self.spf_dirty = true;
        }
    }

    fn process_dd(&mut self, iface: &str, packet: &OspfPacket, dd: &DdPacket) {
        let self_rid = self.config.router_id;
        let version = self.config.version;
        let mut out: Vec<Outgoing> = Vec::new();

        {
            let Some(ifc) = self.interfaces.get_mut(iface) else {
                return;
            };
            let area = ifc.area;
            let Some(nbr) = ifc.neighbors.get_mut(&packet.router_id) else {
                trace!(iface, "来自未知邻居的 DD，忽略");
                return;
            };
            match nbr.state {
                NeighborState::ExStart => {
                    nbr.state = NeighborState::Exchange;
                    debug!(iface, rid = %packet.router_id, dd_seq = dd.dd_seq, "进入 Exchange，回送全库");
                    let lsas: Vec<Lsa> = self.lsdb.area_lsas(area).cloned().collect();
                    out.push((
                        iface.to_string(),
                        OspfPacket {
                            version,
                            router_id: self_rid,
                            area_id: area,
                            body: OspfBody::LinkStateUpdate(LsuPacket { lsas }),
                        },
                        OspfDest::Unicast(nbr.address),
                    ));
                }
                _ => {
                    trace!(iface, state = %nbr.state, "非 ExStart 状态下的 DD，忽略");
                }
            }
        }

        for (ifn, pkt, dest) in out {
            self.emit(&ifn, pkt, dest);
        }
    }

    fn process_lsu(&mut self, iface: &str, packet: &OspfPacket, lsu: &LsuPacket, now: SimTime) {
        let self_rid = self.config.router_id;
        let version = self.config.version;
        let sender = packet.router_id;
        let mut out: Vec<Outgoing> = Vec::new();
        let mut newer: Vec<Lsa> = Vec::new();
        let mut reached_full = false;
        let area;
        let nbr_addr;

        {
            let Some(ifc) = self.interfaces.get_mut(iface) else {
                return;
            };
            area = ifc.area;
            let Some(nbr) = ifc.neighbors.get_mut(&sender) else {
                trace!(iface, "来自未知邻居的 LSU，忽略");
                return;
            };
            nbr_addr = nbr.address;
            if nbr.state == NeighborState::Exchange || nbr.state == NeighborState::Loading {
                // 简化：无未决请求即跳过 Loading 直接 Full
                nbr.state = NeighborState::Full;
                reached_full = true;
                info!(iface, rid = %sender, "邻接达到 Full");
            }
        }

        for lsa in &lsu.lsas {
            let key = lsa.key();
            let newer_than_db = match self.lsdb.get(area, &key) {
                None => true,
                Some(cur) => lsa.header.sequence > cur.header.sequence,
            };
            if newer_than_db {
                self.lsdb.install(area, lsa.clone());
                newer.push(lsa.clone());
            }
        }
        if !newer.is_empty() {
            self.spf_dirty = true;
        }

        out.push((
            iface.to_string(),
            OspfPacket {
                version,
                router_id: self_rid,
                area_id: area,
                body: OspfBody::LinkStateAck(AckPacket {
                    headers: lsu.lsas.iter().map(|l| l.header).collect(),
                }),
            },
            OspfDest::Unicast(nbr_addr),
        ));

        // 把较新的 LSA 继续泛洪给其他 Full 邻居
        out.extend(self.flood_targets(area, Some((iface, sender)), &newer));

        for (ifn, pkt, dest) in out {
            self.emit(&ifn, pkt, dest);
        }

        if reached_full {
            self.originate_router_lsas(now);
            self.spf_dirty = true;
        }
    }

    // ---- 定时驱动 ----

    /// 推进协议定时器：发送到期的 Hello、清除失效邻居、敲定等待
    /// 定时器到期的 DR 选举、推进 LSA 老化。
    pub fn tick(&mut self, now: SimTime) {
        let self_rid = self.config.router_id;
        let mut out: Vec<Outgoing> = Vec::new();
        let mut hello_due: Vec<String> = Vec::new();
        let mut topology_changed = false;

        for (name, ifc) in self.interfaces.iter_mut() {
            if ifc.state == InterfaceState::Down {
                continue;
            }

            // 失效定时器：deadInterval 内无 Hello 的邻居被整体移除
            let dead = SimTime::from_secs(ifc.dead_interval as u64);
            let expired: Vec<RouterId> = ifc
                .neighbors
                .iter()
                .filter(|(_, n)| now.saturating_sub(n.last_hello) >= dead)
                .map(|(rid, _)| *rid)
                .collect();
            for rid in expired {
                let was = ifc.neighbors.remove(&rid).expect("collected above");
                info!(iface = %name, %rid, state = %was.state, "失效定时器到期，移除邻居");
                if was.state >= NeighborState::ExStart {
                    topology_changed = true;
                }
                if ifc.network_type == OspfNetworkType::Broadcast
                    && ifc.state != InterfaceState::Waiting
                {
                    ifc.run_election(self_rid);
                }
            }

            // 等待定时器：到期后敲定 DR/BDR
            if let Some(wait) = ifc.wait_until {
                if now >= wait {
                    ifc.wait_until = None;
                    ifc.run_election(self_rid);
                    topology_changed = true;
                }
            }

            // Hello 定时器
            if !ifc.passive && now >= ifc.next_hello_at {
                ifc.next_hello_at =
                    now.saturating_add(SimTime::from_secs(ifc.hello_interval as u64));
                hello_due.push(name.clone());
            }
        }

        for name in hello_due {
            let hello = self.build_hello(&name);
            out.push((name, hello, OspfDest::AllSpfRouters));
        }

        // LSA 老化（整秒推进）
        let elapsed = now.saturating_sub(self.last_aged).as_secs();
        if elapsed > 0 {
            self.last_aged = self
                .last_aged
                .saturating_add(SimTime::from_secs(elapsed));
            let flushed = self.lsdb.age_all(elapsed.min(u16::MAX as u64) as u16);
            if !flushed.is_empty() {
                self.spf_dirty = true;
            }
            // 自身 LSA 到刷新周期即重新始发
            let refresh_needed = self.interfaces.values().any(|ifc| {
                self.lsdb
                    .get(
                        ifc.area,
                        &LsaKey {
                            ls_type: LsType::Router,
                            link_state_id: self_rid.0,
                            advertising_router: self_rid,
                        },
                    )
                    .is_some_and(|l| l.header.age >= LS_REFRESH_TIME)
            });
            if refresh_needed {
                topology_changed = true;
            }
        }

        for (ifn, pkt, dest) in out {
            self.emit(&ifn, pkt, dest);
        }
        if topology_changed {
            self.originate_router_lsas(now);
            self.spf_dirty = true;
        }
    }

    // ---- LSA 始发与泛洪 ----

    fn next_sequence(&self, area: AreaId, key: &LsaKey) -> i32 {
        match self.lsdb.get(area, key) {
            Some(cur) => cur.header.sequence.saturating_add(1),
            None => INITIAL_SEQUENCE_NUMBER,
        }
    }

    /// 按接口现状重建各区域的 Router-LSA（序列号严格递增），
    /// 必要时以 DR 身份始发 Network-LSA，并向 Full 邻居泛洪。
    ///
    /// 链路规则（保留源行为）：对到达 Full 的邻居生成点到点
    /// 链路；尚无 Full 邻居或被动接口生成 stub 链路；选出 DR 的
    /// 广播接口生成 transit 链路。
    pub fn originate_router_lsas(&mut self, _now: SimTime) {
        let rid = self.config.router_id;
        let areas: BTreeSet<AreaId> = self.interfaces.values().map(|i| i.area).collect();
        let mut originated: Vec<(AreaId, Lsa)> = Vec::new();

        for area in areas {
            let mut links: Vec<RouterLink> = Vec::new();
            for ifc in self.interfaces.values().filter(|i| i.area == area) {
                if ifc.state == InterfaceState::Down {
                    continue;
                }
                let metric = ifc.cost.min(u16::MAX as u32) as u16;
                let stub = RouterLink {
                    kind: RouterLinkKind::Stub,
                    link_id: ifc.ip.mask_with(&ifc.mask).to_u32(),
                    link_data: ifc.mask.to_u32(),
                    metric,
                };
                if ifc.passive {
                    links.push(stub);
                    continue;
                }
                match ifc.network_type {
                    OspfNetworkType::PointToPoint | OspfNetworkType::PointToMultipoint => {
                        if ifc.has_full_neighbor() {
                            for nbr in ifc.full_neighbors() {
                                links.push(RouterLink {
                                    kind: RouterLinkKind::PointToPoint,
                                    link_id: nbr.router_id.0,
                                    link_data: ifc.ip.to_u32(),
                                    metric,
                                });
                            }
                        } else {
                            links.push(stub);
                        }
                    }
                    OspfNetworkType::Broadcast => {
                        if !ifc.dr.is_zero() && ifc.has_full_neighbor() {
                            // transit 链路指向 DR 的接口地址
                            let dr_addr = if ifc.dr == rid {
                                ifc.ip
                            } else {
                                ifc.neighbors
                                    .get(&ifc.dr)
                                    .map(|n| n.address)
                                    .unwrap_or(ifc.ip)
                            };
                            links.push(RouterLink {
                                kind: RouterLinkKind::Transit,
                                link_id: dr_addr.to_u32(),
                                link_data: ifc.ip.to_u32(),
                                metric,
                            });
                        } else {
                            links.push(stub);
                        }
                    }
                }
            }

            let key = LsaKey {
                ls_type: LsType::Router,
                link_state_id: rid.0,
                advertising_router: rid,
            };
            let lsa = Lsa {
                header: LsaHeader {
                    age: 0,
                    ls_type: LsType::Router,
                    link_state_id: rid.0,
                    advertising_router: rid,
                    sequence: self.next_sequence(area, &key),
                },
                body: LsaBody::Router(RouterLsa { links }),
            };
            debug!(%area, seq = lsa.header.sequence, "始发 Router-LSA");
            self.lsdb.install(area, lsa.clone());
            originated.push((area, lsa));

            // DR 为有 Full 邻居的广播网始发 Network-LSA
            let net_lsas: Vec<Lsa> = self
                .interfaces
                .values()
                .filter(|i| {
                    i.area == area
                        && i.network_type == OspfNetworkType::Broadcast
                        && i.state == InterfaceState::Dr
                        && i.has_full_neighbor()
                })
                .map(|ifc| {
                    let mut attached: Vec<RouterId> = vec![rid];
                    attached.extend(ifc.full_neighbors().map(|n| n.router_id));
                    let key = LsaKey {
                        ls_type: LsType::Network,
                        link_state_id: ifc.ip.to_u32(),
                        advertising_router: rid,
                    };
                    Lsa {
                        header: LsaHeader {
                            age: 0,
                            ls_type: LsType::Network,
                            link_state_id: ifc.ip.to_u32(),
                            advertising_router: rid,
                            sequence: self.next_sequence(area, &key),
                        },
                        body: LsaBody::Network(NetworkLsa {
                            mask: ifc.mask,
                            attached,
                        }),
                    }
                })
                .collect();
            for lsa in net_lsas {
                debug!(%area, "始发 Network-LSA");
                self.lsdb.install(area, lsa.clone());
                originated.push((area, lsa));
            }
        }

        // 泛洪
        let mut out: Vec<Outgoing> = Vec::new();
        for (area, lsa) in &originated {
            out.extend(self.flood_targets(*area, None, std::slice::from_ref(lsa)));
        }
        for (ifn, pkt, dest) in out {
            self.emit(&ifn, pkt, dest);
        }
    }

    /// 计算一批 LSA 的泛洪目标（区域内全部 Full 邻居，可排除来源）。
    fn flood_targets(
        &self,
        area: AreaId,
        exclude: Option<(&str, RouterId)>,
        lsas: &[Lsa],
    ) -> Vec<Outgoing> {
        if lsas.is_empty() {
            return Vec::new();
        }
        let mut out = Vec::new();
        for (name, ifc) in &self.interfaces {
            if ifc.area != area {
                continue;
            }
            for nbr in ifc.full_neighbors() {
                if exclude == Some((name.as_str(), nbr.router_id)) {
                    continue;
                }
                out.push((
                    name.clone(),
                    OspfPacket {
                        version: self.config.version,
                        router_id: self.config.router_id,
                        area_id: area,
                        body: OspfBody::LinkStateUpdate(LsuPacket {
                            lsas: lsas.to_vec(),
                        }),
                    },
                    OspfDest::Unicast(nbr.address),
                ));
            }
        }
        out
    }

    fn build_hello(&self, iface: &str) -> OspfPacket {
        let ifc = &self.interfaces[iface];
        let (network_mask, interface_id) = match self.config.version {
            OspfVersion::V2 => (Some(ifc.mask), None),
            OspfVersion::V3 => (None, Some(ifc.interface_id)),
        };
        OspfPacket {
            version: self.config.version,
            router_id: self.config.router_id,
            area_id: ifc.area,
            body: OspfBody::Hello(HelloPacket {
                network_mask,
                interface_id,
                hello_interval: ifc.hello_interval,
                dead_interval: ifc.dead_interval,
                priority: ifc.priority,
                dr: ifc.dr,
                bdr: ifc.bdr,
                neighbors: ifc.neighbors.keys().copied().collect(),
            }),
        }
    }

    fn emit(&mut self, iface: &str, packet: OspfPacket, dest: OspfDest) {
        trace!(iface, kind = packet.kind(), dest = %dest.display_for(packet.version), "发出 OSPF 报文");
        if let Some(cb) = self.send_cb.as_mut() {
            cb(iface, &packet, dest);
        } else {
            trace!("未设置发送回调，报文丢弃");
        }
    }

    // ---- SPF ----

    /// 对全部接口区域运行 SPF，跨区域按网络去重（保留更低开销）。
    pub fn run_spf(&mut self) -> Vec<SpfRoute> {
        let rid = self.config.router_id;
        let areas: BTreeSet<AreaId> = self.interfaces.values().map(|i| i.area).collect();
        let mut best: BTreeMap<(u32, u8), SpfRoute> = BTreeMap::new();

        for area in areas {
            let mut neighbor_hops: BTreeMap<RouterId, FirstHop> = BTreeMap::new();
            let mut local_networks: Vec<(IpAddress, SubnetMask, String)> = Vec::new();
            for ifc in self.interfaces.values().filter(|i| i.area == area) {
                local_networks.push((ifc.ip.mask_with(&ifc.mask), ifc.mask, ifc.name.clone()));
                for nbr in ifc.full_neighbors() {
                    neighbor_hops.insert(
                        nbr.router_id,
                        FirstHop {
                            interface: ifc.name.clone(),
                            next_hop: Some(nbr.address),
                        },
                    );
                }
            }
            for route in spf::compute(&self.lsdb, area, rid, &neighbor_hops, &local_networks) {
                let key = (route.network.to_u32(), route.mask.prefix_len());
                match best.get(&key) {
                    Some(existing) if existing.cost <= route.cost => {}
                    _ => {
                        best.insert(key, route);
                    }
                }
            }
        }

        self.spf_dirty = false;
        best.into_values().collect()
    }
}
