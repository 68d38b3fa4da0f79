use crate::addr::IpAddress;
use crate::net::{DropReason, NetWorld, StartPing};
use crate::sim::{SimTime, Simulator};
use crate::topo::{build_pc_router_pc, PcRouterPcOpts};
use std::sync::{Arc, Mutex};

fn ip(s: &str) -> IpAddress {
    IpAddress::parse(s).expect("ip")
}

#[test]
fn forward_observer_sees_decremented_ttl_and_egress_interface() {
    let mut world = NetWorld::default();
    let mut sim = Simulator::default();
    let topo = build_pc_router_pc(&mut world, &PcRouterPcOpts::default());

    let forwards = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&forwards);
    world
        .net
        .router_mut(topo.router)
        .expect("router")
        .on_forward(Box::new(move |ev| {
            sink.lock()
                .expect("forwards lock")
                .push((ev.interface.clone(), ev.dst, ev.ttl));
        }));

    sim.schedule(
        SimTime::ZERO,
        StartPing {
            host: topo.pc1,
            dst: topo.pc2_ip,
            ttl: 64,
        },
    );
    sim.run(&mut world);

    let events = forwards.lock().expect("forwards lock").clone();
    // 请求与应答各转发一次，每跳 TTL 减一
    assert_eq!(events.len(), 2);
    assert_eq!(events[0], ("gi0/1".to_string(), topo.pc2_ip, 63));
    assert_eq!(events[1], ("gi0/0".to_string(), topo.pc1_ip, 63));
}

#[test]
fn packet_without_route_is_dropped_with_reason() {
    let mut world = NetWorld::default();
    let mut sim = Simulator::default();
    let topo = build_pc_router_pc(&mut world, &PcRouterPcOpts::default());

    let drops = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&drops);
    world
        .net
        .router_mut(topo.router)
        .expect("router")
        .on_drop(Box::new(move |ev| {
            sink.lock().expect("drops lock").push((ev.reason, ev.dst));
        }));

    // 路由器没有 8.8.8.8 的路由，也没有默认路由
    sim.schedule(
        SimTime::ZERO,
        StartPing {
            host: topo.pc1,
            dst: ip("8.8.8.8"),
            ttl: 64,
        },
    );
    sim.run(&mut world);

    let stats = *world.net.router_mut(topo.router).expect("router").stats();
    assert_eq!(stats.packets_received, 1);
    assert_eq!(stats.packets_forwarded, 0);
    assert_eq!(stats.packets_dropped, 1);
    assert_eq!(stats.ttl_expired, 0);
    assert_eq!(
        &*drops.lock().expect("drops lock"),
        &[(DropReason::NoRoute, ip("8.8.8.8"))]
    );
}

#[test]
fn drop_reason_strings_match_network_vocabulary() {
    assert_eq!(DropReason::TtlExpired.to_string(), "TTL expired");
    assert_eq!(DropReason::NoRoute.to_string(), "no route to host");
    assert_eq!(DropReason::NoArpEntry.to_string(), "no ARP entry");
    assert_eq!(DropReason::LinkDown.to_string(), "link down");
}

#[test]
fn missing_arp_entry_drops_instead_of_forwarding() {
    let mut world = NetWorld::default();
    let mut sim = Simulator::default();
    let topo = build_pc_router_pc(&mut world, &PcRouterPcOpts::default());

    let drops = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&drops);
    {
        let r = world.net.router_mut(topo.router).expect("router");
        r.on_drop(Box::new(move |ev| {
            sink.lock().expect("drops lock").push(ev.reason);
        }));
    }
    // 用一个路由可达但 ARP 未知的地址
    sim.schedule(
        SimTime::ZERO,
        StartPing {
            host: topo.pc1,
            dst: ip("192.168.2.99"),
            ttl: 64,
        },
    );
    sim.run(&mut world);

    assert_eq!(
        &*drops.lock().expect("drops lock"),
        &[DropReason::NoArpEntry]
    );
}

#[test]
fn accounting_invariant_received_equals_forwarded_plus_dropped() {
    let mut world = NetWorld::default();
    let mut sim = Simulator::default();
    let topo = build_pc_router_pc(&mut world, &PcRouterPcOpts::default());

    // 成功、无路由、TTL 过期混合
    for (i, (dst, ttl)) in [
        (topo.pc2_ip, 64),
        (ip("8.8.8.8"), 64),
        (topo.pc2_ip, 1),
        (topo.pc2_ip, 32),
    ]
    .into_iter()
    .enumerate()
    {
        sim.schedule(
            SimTime::from_millis(i as u64 * 10),
            StartPing {
                host: topo.pc1,
                dst,
                ttl,
            },
        );
    }
    sim.run(&mut world);

    let stats = *world.net.router_mut(topo.router).expect("router").stats();
    assert_eq!(
        stats.packets_received,
        stats.packets_forwarded + stats.packets_dropped
    );
    assert!(stats.packets_forwarded >= 4, "two round trips forwarded");
    assert_eq!(stats.ttl_expired, 1);
}
