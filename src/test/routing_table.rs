use crate::addr::{IpAddress, SubnetMask};
use crate::route::{Route, RouteKind, RoutingTable};

fn ip(s: &str) -> IpAddress {
    IpAddress::parse(s).expect("ip")
}

fn mask(len: u32) -> SubnetMask {
    SubnetMask::from_prefix_len(len).expect("mask")
}

#[test]
fn lookup_prefers_longest_prefix() {
    let mut rt = RoutingTable::new();
    rt.add(Route::new(
        ip("172.16.0.0"),
        mask(16),
        Some(ip("10.0.0.1")),
        "gi0/0",
        RouteKind::Static,
        1,
    ));
    rt.add(Route::new(
        ip("172.16.5.0"),
        mask(24),
        Some(ip("10.0.0.2")),
        "gi0/1",
        RouteKind::Static,
        1,
    ));

    let hit = rt.lookup(&ip("172.16.5.10")).expect("route");
    assert_eq!(hit.mask.prefix_len(), 24);
    assert_eq!(hit.interface, "gi0/1");

    // /16 仍然覆盖其余地址
    let hit = rt.lookup(&ip("172.16.9.10")).expect("route");
    assert_eq!(hit.mask.prefix_len(), 16);
}

#[test]
fn lookup_prefers_a_24_over_an_8() {
    let mut rt = RoutingTable::new();
    rt.add(Route::new(
        ip("10.0.0.0"),
        mask(8),
        Some(ip("10.0.0.1")),
        "gi0/0",
        RouteKind::Static,
        1,
    ));
    rt.add(Route::new(
        ip("10.1.2.0"),
        mask(24),
        Some(ip("10.0.0.2")),
        "gi0/1",
        RouteKind::Static,
        1,
    ));

    assert_eq!(
        rt.lookup(&ip("10.1.2.3")).expect("route").interface,
        "gi0/1"
    );
}

#[test]
fn equal_prefix_lower_admin_distance_wins() {
    let mut rt = RoutingTable::new();
    rt.add(Route::new(
        ip("10.1.0.0"),
        mask(24),
        Some(ip("10.0.0.1")),
        "ospf",
        RouteKind::OspfIntraArea,
        1,
    ));
    rt.add(Route::new(
        ip("10.1.0.0"),
        mask(24),
        Some(ip("10.0.0.2")),
        "static",
        RouteKind::Static,
        10,
    ));

    // 静态路由管理距离 1 胜过 OSPF 110，即使度量更大
    assert_eq!(rt.lookup(&ip("10.1.0.9")).expect("route").interface, "static");
}

#[test]
fn equal_prefix_and_distance_lower_metric_wins() {
    let mut rt = RoutingTable::new();
    rt.add(Route::new(
        ip("10.1.0.0"),
        mask(24),
        Some(ip("10.0.0.1")),
        "high",
        RouteKind::Static,
        20,
    ));
    rt.add(Route::new(
        ip("10.1.0.0"),
        mask(24),
        Some(ip("10.0.0.2")),
        "low",
        RouteKind::Static,
        5,
    ));

    assert_eq!(rt.lookup(&ip("10.1.0.9")).expect("route").interface, "low");
}

#[test]
fn full_tie_falls_back_to_configuration_order() {
    let mut rt = RoutingTable::new();
    rt.add(Route::new(
        ip("10.1.0.0"),
        mask(24),
        Some(ip("10.0.0.1")),
        "first",
        RouteKind::Static,
        5,
    ));
    rt.add(Route::new(
        ip("10.1.0.0"),
        mask(24),
        Some(ip("10.0.0.2")),
        "second",
        RouteKind::Static,
        5,
    ));

    assert_eq!(rt.lookup(&ip("10.1.0.9")).expect("route").interface, "first");
}

#[test]
fn default_route_matches_only_when_nothing_better() {
    let mut rt = RoutingTable::new();
    rt.set_default(ip("10.0.0.254"), "gi0/0");
    rt.add_connected("gi0/1", ip("192.168.1.1"), mask(24));

    assert_eq!(
        rt.lookup(&ip("8.8.8.8")).expect("default").kind,
        RouteKind::Default
    );
    assert_eq!(
        rt.lookup(&ip("192.168.1.42")).expect("connected").kind,
        RouteKind::Connected
    );
}

#[test]
fn lookup_returns_none_without_any_match() {
    let mut rt = RoutingTable::new();
    rt.add_connected("gi0/0", ip("192.168.1.1"), mask(24));
    assert!(rt.lookup(&ip("8.8.8.8")).is_none());
}

#[test]
fn connected_routes_follow_interface_address_lifecycle() {
    let mut rt = RoutingTable::new();
    rt.add_connected("gi0/0", ip("192.168.1.1"), mask(24));
    assert_eq!(rt.len(), 1);

    // 重新编址：旧直连路由被替换
    rt.add_connected("gi0/0", ip("10.0.0.1"), mask(8));
    assert_eq!(rt.len(), 1);
    assert!(rt.lookup(&ip("192.168.1.5")).is_none());
    assert!(rt.lookup(&ip("10.9.9.9")).is_some());

    rt.remove_connected("gi0/0");
    assert!(rt.is_empty());
}

#[test]
fn replace_ospf_swaps_routes_wholesale() {
    let mut rt = RoutingTable::new();
    rt.add_connected("gi0/0", ip("192.168.1.1"), mask(24));
    rt.replace_ospf(vec![Route::new(
        ip("10.1.0.0"),
        mask(24),
        Some(ip("192.168.1.2")),
        "gi0/0",
        RouteKind::OspfIntraArea,
        2,
    )]);
    assert_eq!(rt.len(), 2);

    rt.replace_ospf(vec![
        Route::new(
            ip("10.2.0.0"),
            mask(24),
            Some(ip("192.168.1.3")),
            "gi0/0",
            RouteKind::OspfIntraArea,
            2,
        ),
        Route::new(
            ip("10.3.0.0"),
            mask(24),
            Some(ip("192.168.1.3")),
            "gi0/0",
            RouteKind::OspfIntraArea,
            4,
        ),
    ]);
    assert_eq!(rt.len(), 3);
    assert!(rt.lookup(&ip("10.1.0.1")).is_none(), "old ospf route gone");
    assert!(rt.lookup(&ip("10.2.0.1")).is_some());

    rt.remove_static(ip("10.2.0.0"), mask(24)); // 静态删除不影响 OSPF 路由
    assert_eq!(rt.len(), 3);
}
