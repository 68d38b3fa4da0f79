use crate::addr::{IpAddress, SubnetMask};
use crate::ospf::{
    AreaId, HelloPacket, InterfaceOpts, InterfaceState, NeighborState, OspfBody, OspfNetworkType,
    OspfPacket, OspfProcess, OspfVersion, RouterId,
};
use crate::sim::SimTime;
use std::sync::{Arc, Mutex};

fn ip(s: &str) -> IpAddress {
    IpAddress::parse(s).expect("ip")
}

fn mask24() -> SubnetMask {
    SubnetMask::from_prefix_len(24).expect("mask")
}

fn silence(engine: &mut OspfProcess) {
    let sink: Arc<Mutex<Vec<()>>> = Arc::new(Mutex::new(Vec::new()));
    let s = Arc::clone(&sink);
    engine.set_send_callback(Box::new(move |_, _, _| {
        s.lock().expect("sink lock").push(());
    }));
}

/// rid `rid` 的广播引擎，eth0 = 192.168.0.<rid>/24。
fn broadcast_engine(rid: u32, priority: u8) -> OspfProcess {
    let mut e = OspfProcess::new(RouterId(rid), OspfVersion::V2);
    silence(&mut e);
    e.activate_interface(
        "eth0",
        IpAddress::new(192, 168, 0, rid as u8),
        mask24(),
        Some(AreaId::BACKBONE),
        InterfaceOpts {
            network_type: OspfNetworkType::Broadcast,
            priority,
            ..Default::default()
        },
        SimTime::ZERO,
    )
    .expect("activate");
    e
}

fn hello_from(rid: u32, priority: u8, neighbors: &[u32]) -> OspfPacket {
    OspfPacket {
        version: OspfVersion::V2,
        router_id: RouterId(rid),
        area_id: AreaId::BACKBONE,
        body: OspfBody::Hello(HelloPacket {
            network_mask: Some(mask24()),
            interface_id: None,
            hello_interval: 10,
            dead_interval: 40,
            priority,
            dr: RouterId::ZERO,
            bdr: RouterId::ZERO,
            neighbors: neighbors.iter().map(|r| RouterId(*r)).collect(),
        }),
    }
}

#[test]
fn broadcast_interface_waits_one_dead_interval_before_electing() {
    let mut e = broadcast_engine(1, 1);
    assert_eq!(e.interface("eth0").expect("eth0").state, InterfaceState::Waiting);

    e.tick(SimTime::from_secs(39));
    assert_eq!(
        e.interface("eth0").expect("eth0").state,
        InterfaceState::Waiting,
        "no DR decision during the wait timer"
    );
}

#[test]
fn lone_router_becomes_dr_after_the_wait_timer() {
    let mut e = broadcast_engine(1, 1);
    e.tick(SimTime::from_secs(40));

    let ifc = e.interface("eth0").expect("eth0");
    assert_eq!(ifc.state, InterfaceState::Dr);
    assert_eq!(ifc.dr, RouterId(1));
    assert_eq!(ifc.bdr, RouterId::ZERO);
}

#[test]
fn priority_zero_router_is_never_eligible() {
    let mut e = broadcast_engine(1, 0);
    e.tick(SimTime::from_secs(40));

    let ifc = e.interface("eth0").expect("eth0");
    assert_eq!(ifc.state, InterfaceState::DrOther);
    assert_eq!(ifc.dr, RouterId::ZERO, "no candidate at all");
}

#[test]
fn priority_zero_neighbor_is_never_elected_even_with_higher_router_id() {
    let mut e = broadcast_engine(1, 1);
    e.process_packet(
        "eth0",
        ip("192.168.0.9"),
        &hello_from(9, 0, &[1]),
        SimTime::from_secs(1),
    );
    e.tick(SimTime::from_secs(40));

    let ifc = e.interface("eth0").expect("eth0");
    assert_eq!(ifc.dr, RouterId(1));
    assert_eq!(ifc.state, InterfaceState::Dr);
}

#[test]
fn equal_priority_ties_break_on_highest_router_id() {
    let mut e = broadcast_engine(1, 1);
    e.process_packet(
        "eth0",
        ip("192.168.0.9"),
        &hello_from(9, 1, &[1]),
        SimTime::from_secs(1),
    );
    assert_eq!(
        e.interface("eth0")
            .expect("eth0")
            .neighbors
            .get(&RouterId(9))
            .expect("neighbor")
            .state,
        NeighborState::TwoWay
    );

    e.tick(SimTime::from_secs(40));
    let ifc = e.interface("eth0").expect("eth0");
    assert_eq!(ifc.dr, RouterId(9), "highest router id wins the tie");
    assert_eq!(ifc.bdr, RouterId(1));
    assert_eq!(ifc.state, InterfaceState::Backup);
}

#[test]
fn higher_priority_beats_higher_router_id() {
    let mut e = broadcast_engine(5, 100);
    e.process_packet(
        "eth0",
        ip("192.168.0.9"),
        &hello_from(9, 1, &[5]),
        SimTime::from_secs(1),
    );
    e.tick(SimTime::from_secs(40));

    let ifc = e.interface("eth0").expect("eth0");
    assert_eq!(ifc.dr, RouterId(5));
    assert_eq!(ifc.state, InterfaceState::Dr);
}

#[test]
fn election_is_reevaluated_when_a_neighbor_reaches_two_way_after_the_wait() {
    let mut e = broadcast_engine(1, 1);
    e.tick(SimTime::from_secs(40));
    assert_eq!(e.interface("eth0").expect("eth0").dr, RouterId(1));

    e.process_packet(
        "eth0",
        ip("192.168.0.9"),
        &hello_from(9, 1, &[1]),
        SimTime::from_secs(41),
    );
    assert_eq!(e.interface("eth0").expect("eth0").dr, RouterId(9));
}

#[test]
fn point_to_point_interfaces_bypass_election_entirely() {
    let mut e = OspfProcess::new(RouterId(1), OspfVersion::V2);
    silence(&mut e);
    e.activate_interface(
        "s0",
        ip("10.0.0.1"),
        SubnetMask::from_prefix_len(30).expect("mask"),
        Some(AreaId::BACKBONE),
        InterfaceOpts {
            network_type: OspfNetworkType::PointToPoint,
            ..Default::default()
        },
        SimTime::ZERO,
    )
    .expect("activate");

    let ifc = e.interface("s0").expect("s0");
    assert_eq!(ifc.state, InterfaceState::PointToPoint);
    assert_eq!(ifc.dr, RouterId::ZERO);
    assert_eq!(ifc.bdr, RouterId::ZERO);
}
