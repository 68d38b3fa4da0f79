use crate::addr::{IpAddress, SubnetMask};
use crate::ospf::{
    AreaId, DdPacket, HelloPacket, InterfaceOpts, LsuPacket, NeighborState, OspfBody, OspfDest,
    OspfNetworkType, OspfPacket, OspfProcess, OspfVersion, RouterId,
};
use crate::sim::SimTime;
use std::sync::{Arc, Mutex};

type Sent = Arc<Mutex<Vec<(String, OspfPacket, OspfDest)>>>;

fn tap(engine: &mut OspfProcess) -> Sent {
    let sent: Sent = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&sent);
    engine.set_send_callback(Box::new(move |iface, pkt, dest| {
        sink.lock()
            .expect("sent lock")
            .push((iface.to_string(), pkt.clone(), dest));
    }));
    sent
}

fn ip(s: &str) -> IpAddress {
    IpAddress::parse(s).expect("ip")
}

fn mask(len: u32) -> SubnetMask {
    SubnetMask::from_prefix_len(len).expect("mask")
}

fn p2p_opts() -> InterfaceOpts {
    InterfaceOpts {
        network_type: OspfNetworkType::PointToPoint,
        ..Default::default()
    }
}

/// rid 1 的点到点引擎，s0 = 10.0.0.1/30，骨干区域。
fn engine_p2p() -> (OspfProcess, Sent) {
    let mut e = OspfProcess::new(RouterId(1), OspfVersion::V2);
    let sent = tap(&mut e);
    e.activate_interface(
        "s0",
        ip("10.0.0.1"),
        mask(30),
        Some(AreaId::BACKBONE),
        p2p_opts(),
        SimTime::ZERO,
    )
    .expect("activate");
    sent.lock().expect("sent lock").clear();
    (e, sent)
}

fn hello_packet(from: u32, neighbors: &[u32]) -> OspfPacket {
    hello_with(from, neighbors, 10, 40)
}

fn hello_with(from: u32, neighbors: &[u32], hello_interval: u16, dead_interval: u32) -> OspfPacket {
    OspfPacket {
        version: OspfVersion::V2,
        router_id: RouterId(from),
        area_id: AreaId::BACKBONE,
        body: OspfBody::Hello(HelloPacket {
            network_mask: Some(mask(30)),
            interface_id: None,
            hello_interval,
            dead_interval,
            priority: 1,
            dr: RouterId::ZERO,
            bdr: RouterId::ZERO,
            neighbors: neighbors.iter().map(|r| RouterId(*r)).collect(),
        }),
    }
}

fn neighbor_state(engine: &OspfProcess, rid: u32) -> Option<NeighborState> {
    engine
        .interface("s0")
        .expect("s0")
        .neighbors
        .get(&RouterId(rid))
        .map(|n| n.state)
}

#[test]
fn hello_from_unknown_sender_creates_neighbor_in_init() {
    let (mut e, _sent) = engine_p2p();
    e.process_packet("s0", ip("10.0.0.2"), &hello_packet(2, &[]), SimTime::ZERO);
    assert_eq!(neighbor_state(&e, 2), Some(NeighborState::Init));
}

#[test]
fn hello_listing_our_router_id_forms_adjacency() {
    let (mut e, sent) = engine_p2p();
    e.process_packet("s0", ip("10.0.0.2"), &hello_packet(2, &[1]), SimTime::ZERO);
    assert_eq!(neighbor_state(&e, 2), Some(NeighborState::ExStart));

    // 进入 ExStart 时向对端单播一个 DatabaseDescription
    let out = sent.lock().expect("sent lock").clone();
    assert!(out.iter().any(|(iface, pkt, dest)| {
        iface == "s0"
            && matches!(pkt.body, OspfBody::DatabaseDescription(_))
            && *dest == OspfDest::Unicast(ip("10.0.0.2"))
    }));
}

#[test]
fn dd_then_lsu_completes_the_exchange_to_full() {
    let (mut e, sent) = engine_p2p();
    let peer = ip("10.0.0.2");
    e.process_packet("s0", peer, &hello_packet(2, &[1]), SimTime::ZERO);

    let dd = OspfPacket {
        version: OspfVersion::V2,
        router_id: RouterId(2),
        area_id: AreaId::BACKBONE,
        body: OspfBody::DatabaseDescription(DdPacket {
            dd_seq: 77,
            headers: Vec::new(),
        }),
    };
    e.process_packet("s0", peer, &dd, SimTime::from_secs(1));
    assert_eq!(neighbor_state(&e, 2), Some(NeighborState::Exchange));
    // Exchange 以全库 LSU 应答
    assert!(sent
        .lock()
        .expect("sent lock")
        .iter()
        .any(|(_, pkt, _)| matches!(pkt.body, OspfBody::LinkStateUpdate(_))));

    let lsu = OspfPacket {
        version: OspfVersion::V2,
        router_id: RouterId(2),
        area_id: AreaId::BACKBONE,
        body: OspfBody::LinkStateUpdate(LsuPacket { lsas: Vec::new() }),
    };
    e.process_packet("s0", peer, &lsu, SimTime::from_secs(1));
    assert_eq!(neighbor_state(&e, 2), Some(NeighborState::Full));
}

#[test]
fn hello_no_longer_listing_us_regresses_to_init() {
    let (mut e, _sent) = engine_p2p();
    let peer = ip("10.0.0.2");
    e.process_packet("s0", peer, &hello_packet(2, &[1]), SimTime::ZERO);
    assert_eq!(neighbor_state(&e, 2), Some(NeighborState::ExStart));

    // OneWay：对端的邻居列表不再包含我们
    e.process_packet("s0", peer, &hello_packet(2, &[]), SimTime::from_secs(5));
    assert_eq!(neighbor_state(&e, 2), Some(NeighborState::Init));
}

#[test]
fn neighbor_is_removed_after_dead_interval_without_hello() {
    let (mut e, _sent) = engine_p2p();
    e.process_packet("s0", ip("10.0.0.2"), &hello_packet(2, &[]), SimTime::ZERO);

    e.tick(SimTime::from_secs(39));
    assert!(neighbor_state(&e, 2).is_some(), "39s < deadInterval");

    e.tick(SimTime::from_secs(40));
    assert!(neighbor_state(&e, 2).is_none(), "removed at deadInterval");
}

#[test]
fn each_hello_resets_the_dead_timer() {
    let (mut e, _sent) = engine_p2p();
    let peer = ip("10.0.0.2");
    e.process_packet("s0", peer, &hello_packet(2, &[]), SimTime::ZERO);

    // deadInterval − 1 时刻的 Hello 让邻居活过原定的 40s 期限
    e.process_packet("s0", peer, &hello_packet(2, &[]), SimTime::from_secs(39));
    e.tick(SimTime::from_secs(40));
    assert!(neighbor_state(&e, 2).is_some(), "refreshed at 39s");
    e.tick(SimTime::from_secs(78));
    assert!(neighbor_state(&e, 2).is_some(), "39 + 40 > 78");
    e.tick(SimTime::from_secs(79));
    assert!(neighbor_state(&e, 2).is_none());
}

#[test]
fn hello_with_mismatched_intervals_is_silently_rejected() {
    let (mut e, _sent) = engine_p2p();
    e.process_packet(
        "s0",
        ip("10.0.0.2"),
        &hello_with(2, &[], 5, 40),
        SimTime::ZERO,
    );
    assert!(neighbor_state(&e, 2).is_none(), "helloInterval mismatch");

    e.process_packet(
        "s0",
        ip("10.0.0.2"),
        &hello_with(2, &[], 10, 120),
        SimTime::ZERO,
    );
    assert!(neighbor_state(&e, 2).is_none(), "deadInterval mismatch");
}

#[test]
fn hello_from_our_own_router_id_is_ignored() {
    let (mut e, _sent) = engine_p2p();
    e.process_packet("s0", ip("10.0.0.9"), &hello_packet(1, &[]), SimTime::ZERO);
    assert!(e.interface("s0").expect("s0").neighbors.is_empty());
}

#[test]
fn hello_on_unknown_interface_is_ignored() {
    let (mut e, _sent) = engine_p2p();
    e.process_packet("s9", ip("10.0.0.2"), &hello_packet(2, &[]), SimTime::ZERO);
    assert!(e.interface("s0").expect("s0").neighbors.is_empty());
}

#[test]
fn kill_neighbor_goes_down_but_entry_is_retained() {
    let (mut e, _sent) = engine_p2p();
    e.process_packet("s0", ip("10.0.0.2"), &hello_packet(2, &[1]), SimTime::ZERO);
    assert_eq!(neighbor_state(&e, 2), Some(NeighborState::ExStart));

    e.kill_neighbor("s0", RouterId(2));
    assert_eq!(neighbor_state(&e, 2), Some(NeighborState::Down));

    // 下一次清理（失效定时器）才真正移除
    e.tick(SimTime::from_secs(40));
    assert!(neighbor_state(&e, 2).is_none());
}
