//! SPF 计算
//!
//! 在区域 LSDB 图上运行 Dijkstra：顶点是 Router-LSA 与
//! Network-LSA，边来自链路/attached 列表，权重为通告度量。
//! 只有数据库中存在反向链路的边才可用；根的邻接边还要求对应
//! 邻居已达 Full（由调用方提供首跳表），2-Way 及以下的邻居即使
//! 在库里有链路也不构成可达性。空库或仅含自身时返回空表，绝不
//! panic。

use super::lsa::{LsaBody, NetworkLsa, RouterLinkKind, RouterLsa};
use super::lsdb::Lsdb;
use super::types::{AreaId, RouterId};
use crate::addr::{IpAddress, SubnetMask};
use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap};
use tracing::{debug, trace};

/// SPF 路由类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpfRouteKind {
    IntraArea,
    InterArea,
    External,
}

/// SPF 输出的一条路由。
#[derive(Debug, Clone)]
pub struct SpfRoute {
    pub network: IpAddress,
    pub mask: SubnetMask,
    pub next_hop: Option<IpAddress>,
    pub interface: String,
    pub cost: u32,
    pub area: AreaId,
    pub kind: SpfRouteKind,
}

/// 根到某顶点的首跳：出接口与下一跳地址（直连网络无下一跳）。
#[derive(Debug, Clone)]
pub struct FirstHop {
    pub interface: String,
    pub next_hop: Option<IpAddress>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Vertex {
    Router(RouterId),
    Network(u32),
}

fn relax(
    dist: &mut BTreeMap<Vertex, u32>,
    hop: &mut BTreeMap<Vertex, Option<FirstHop>>,
    heap: &mut BinaryHeap<Reverse<(u32, Vertex)>>,
    v: Vertex,
    cost: u32,
    first_hop: Option<FirstHop>,
) {
    let better = dist.get(&v).map(|d| cost < *d).unwrap_or(true);
    if better {
        dist.insert(v, cost);
        hop.insert(v, first_hop);
        heap.push(Reverse((cost, v)));
    }
}

/// 对一个区域运行 SPF。
pub fn compute(
    lsdb: &Lsdb,
    area: AreaId,
    root: RouterId,
    neighbor_hops: &BTreeMap<RouterId, FirstHop>,
    local_networks: &[(IpAddress, SubnetMask, String)],
) -> Vec<SpfRoute> {
    let mut routers: BTreeMap<RouterId, &RouterLsa> = BTreeMap::new();
    let mut networks: BTreeMap<u32, &NetworkLsa> = BTreeMap::new();
    for lsa in lsdb.area_lsas(area) {
        match &lsa.body {
            LsaBody::Router(r) => {
                routers.insert(lsa.header.advertising_router, r);
            }
            LsaBody::Network(n) => {
                networks.insert(lsa.header.link_state_id, n);
            }
            _ => {}
        }
    }
    if !routers.contains_key(&root) {
        debug!(%area, %root, "LSDB 中没有根顶点，SPF 结果为空");
        return Vec::new();
    }

    let mut dist: BTreeMap<Vertex, u32> = BTreeMap::new();
    let mut hop: BTreeMap<Vertex, Option<FirstHop>> = BTreeMap::new();
    let mut heap: BinaryHeap<Reverse<(u32, Vertex)>> = BinaryHeap::new();

    let root_v = Vertex::Router(root);
    dist.insert(root_v, 0);
    hop.insert(root_v, None);
    heap.push(Reverse((0, root_v)));

    while let Some(Reverse((d, v))) = heap.pop() {
        if dist.get(&v) != Some(&d) {
            continue; // 过期表项
        }
        let inherited = hop.get(&v).cloned().unwrap_or(None);
        match v {
            Vertex::Router(rid) => {
                let Some(rlsa) = routers.get(&rid) else {
                    continue;
                };
                for link in &rlsa.links {
                    match link.kind {
                        RouterLinkKind::PointToPoint => {
                            let nrid = RouterId(link.link_id);
                            // 反向链路校验
                            let Some(nlsa) = routers.get(&nrid) else {
                                continue;
                            };
                            let back = nlsa.links.iter().any(|l| {
                                l.kind == RouterLinkKind::PointToPoint && l.link_id == rid.0
                            });
                            if !back {
                                continue;
                            }
                            let nh = if rid == root {
                                // 根的邻接边：仅 Full 邻居可用
                                match neighbor_hops.get(&nrid) {
                                    Some(h) => Some(h.clone()),
                                    None => {
                                        trace!(%nrid, "邻居未达 Full，邻接边不可用");
                                        continue;
                                    }
                                }
                            } else {
                                inherited.clone()
                            };
                            relax(
                                &mut dist,
                                &mut hop,
                                &mut heap,
                                Vertex::Router(nrid),
                                d.saturating_add(link.metric as u32),
                                nh,
                            );
                        }
                        RouterLinkKind::Transit => {
                            let nid = link.link_id;
                            let Some(nlsa) = networks.get(&nid) else {
                                continue;
                            };
                            if !nlsa.attached.contains(&rid) {
                                continue;
                            }
                            let nh = if rid == root {
                                let naddr = IpAddress::from_u32(nid);
                                match local_networks
                                    .iter()
                                    .find(|(net, mask, _)| naddr.mask_with(mask) == *net)
                                {
                                    Some((_, _, ifname)) => Some(FirstHop {
                                        interface: ifname.clone(),
                                        next_hop: None,
                                    }),
                                    None => continue,
                                }
                            } else {
                                inherited.clone()
                            };
                            relax(
                                &mut dist,
                                &mut hop,
                                &mut heap,
                                Vertex::Network(nid),
                                d.saturating_add(link.metric as u32),
                                nh,
                            );
                        }
                        RouterLinkKind::Stub => {} // 路由生成阶段处理
                    }
                }
            }
            Vertex::Network(nid) => {
                let Some(nlsa) = networks.get(&nid) else {
                    continue;
                };
                for &arid in &nlsa.attached {
                    let Some(rlsa) = routers.get(&arid) else {
                        continue;
                    };
                    let Some(tlink) = rlsa
                        .links
                        .iter()
                        .find(|l| l.kind == RouterLinkKind::Transit && l.link_id == nid)
                    else {
                        continue;
                    };
                    // 根直连网络上的路由器：下一跳取其在该网络上的接口地址
                    let nh = match &inherited {
                        Some(h) if h.next_hop.is_none() => Some(FirstHop {
                            interface: h.interface.clone(),
                            next_hop: Some(IpAddress::from_u32(tlink.link_data)),
                        }),
                        other => other.clone(),
                    };
                    relax(
                        &mut dist,
                        &mut hop,
                        &mut heap,
                        Vertex::Router(arid),
                        d,
                        nh,
                    );
                }
            }
        }
    }

    // 路由生成：网络顶点、远端路由器的 stub 链路、汇总与外部 LSA。
    let mut routes: BTreeMap<(u32, u8), SpfRoute> = BTreeMap::new();
    let mut put = |network: IpAddress, mask: SubnetMask, cost: u32, h: &FirstHop, kind| {
        let key = (network.mask_with(&mask).to_u32(), mask.prefix_len());
        let candidate = SpfRoute {
            network: network.mask_with(&mask),
            mask,
            next_hop: h.next_hop,
            interface: h.interface.clone(),
            cost,
            area,
            kind,
        };
        match routes.get(&key) {
            Some(existing) if existing.cost <= cost => {}
            _ => {
                routes.insert(key, candidate);
            }
        }
    };

    for (nid, nlsa) in &networks {
        let v = Vertex::Network(*nid);
        let (Some(d), Some(Some(h))) = (dist.get(&v), hop.get(&v)) else {
            continue;
        };
        put(
            IpAddress::from_u32(*nid),
            nlsa.mask,
            *d,
            h,
            SpfRouteKind::IntraArea,
        );
    }

    for (rid, rlsa) in &routers {
        if *rid == root {
            continue; // 自身的 stub 即直连网络
        }
        let v = Vertex::Router(*rid);
        let (Some(d), Some(Some(h))) = (dist.get(&v), hop.get(&v)) else {
            continue;
        };
        for link in &rlsa.links {
            if link.kind == RouterLinkKind::Stub {
                let mask = SubnetMask::from_bits(link.link_data);
                put(
                    IpAddress::from_u32(link.link_id),
                    mask,
                    d.saturating_add(link.metric as u32),
                    h,
                    SpfRouteKind::IntraArea,
                );
            }
        }
    }

    for lsa in lsdb.area_lsas(area) {
        if let LsaBody::Summary(s) = &lsa.body {
            let v = Vertex::Router(lsa.header.advertising_router);
            let (Some(d), Some(Some(h))) = (dist.get(&v), hop.get(&v)) else {
                continue;
            };
            put(
                IpAddress::from_u32(lsa.header.link_state_id),
                s.mask,
                d.saturating_add(s.metric),
                h,
                SpfRouteKind::InterArea,
            );
        }
    }

    for lsa in lsdb.externals() {
        if let LsaBody::External(e) = &lsa.body {
            let v = Vertex::Router(lsa.header.advertising_router);
            let (Some(d), Some(Some(h))) = (dist.get(&v), hop.get(&v)) else {
                continue;
            };
            put(
                IpAddress::from_u32(lsa.header.link_state_id),
                e.mask,
                d.saturating_add(e.metric),
                h,
                SpfRouteKind::External,
            );
        }
    }

    debug!(%area, routes = routes.len(), "SPF 完成");
    routes.into_values().collect()
}
