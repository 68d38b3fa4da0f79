use crate::net::NetWorld;
use crate::sim::{SimTime, Simulator};
use crate::topo::{
    build_scenario, collect_ping_summaries, schedule_pings, ScenarioError, ScenarioSpec,
};

fn parse(json: &str) -> ScenarioSpec {
    serde_json::from_str(json).expect("scenario json")
}

const SWITCHED_PAIR: &str = r#"
{
  "schema_version": 1,
  "meta": { "name": "switched-pair" },
  "devices": [
    { "name": "pc1", "kind": "pc",
      "interfaces": [ { "ip": "10.0.0.1", "mask": "255.255.255.0" } ] },
    { "name": "pc2", "kind": "pc",
      "interfaces": [ { "ip": "10.0.0.2", "mask": "24" } ] },
    { "name": "sw1", "kind": "switch", "ports": 4 }
  ],
  "cables": [
    { "a": "pc1:eth0", "b": "sw1:fa0/1" },
    { "a": "pc2:eth0", "b": "sw1:fa0/2" }
  ],
  "pings": [
    { "from": "pc1", "to": "10.0.0.2", "count": 2, "gap_ms": 100 }
  ]
}
"#;

#[test]
fn minimal_scenario_parses_with_defaults() {
    let spec = parse(
        r#"{ "schema_version": 1, "devices": [ { "name": "pc1", "kind": "pc" } ] }"#,
    );
    assert_eq!(spec.schema_version, 1);
    assert!(spec.cables.is_empty());
    assert!(spec.pings.is_empty());
    assert!(spec.auto_arp.is_none());
    assert!(spec.meta.is_none());
}

#[test]
fn switched_pair_scenario_builds_and_pings_succeed() {
    let spec = parse(SWITCHED_PAIR);
    let mut world = NetWorld::default();
    let mut sim = Simulator::default();

    let built = build_scenario(&spec, &mut world).expect("build");
    assert_eq!(built.devices.len(), 3);
    schedule_pings(&spec, &built, &mut sim).expect("schedule");
    sim.run_until(SimTime::from_secs(10), &mut world);

    let summaries = collect_ping_summaries(&mut world, &built);
    let pc1 = summaries.iter().find(|s| s.host == "pc1").expect("pc1");
    assert_eq!(pc1.sent, 2);
    assert_eq!(pc1.replied, 2, "auto_arp seeds same-subnet mappings");
    assert!(pc1.loss_percent.abs() < f64::EPSILON);
}

#[test]
fn duplicate_device_names_are_rejected() {
    let spec = parse(
        r#"{ "schema_version": 1, "devices": [
            { "name": "pc1", "kind": "pc" },
            { "name": "pc1", "kind": "pc" } ] }"#,
    );
    let mut world = NetWorld::default();
    assert!(matches!(
        build_scenario(&spec, &mut world),
        Err(ScenarioError::DuplicateDevice(_))
    ));
}

#[test]
fn unknown_cable_device_is_rejected() {
    let spec = parse(
        r#"{ "schema_version": 1,
             "devices": [ { "name": "pc1", "kind": "pc" } ],
             "cables": [ { "a": "pc1:eth0", "b": "ghost:eth0" } ] }"#,
    );
    let mut world = NetWorld::default();
    assert!(matches!(
        build_scenario(&spec, &mut world),
        Err(ScenarioError::UnknownDevice(_))
    ));
}

#[test]
fn cable_endpoint_without_a_port_is_rejected() {
    let spec = parse(
        r#"{ "schema_version": 1,
             "devices": [ { "name": "pc1", "kind": "pc" }, { "name": "pc2", "kind": "pc" } ],
             "cables": [ { "a": "pc1", "b": "pc2:eth0" } ] }"#,
    );
    let mut world = NetWorld::default();
    assert!(matches!(
        build_scenario(&spec, &mut world),
        Err(ScenarioError::BadEndpoint(_))
    ));
}

#[test]
fn router_interfaces_require_names() {
    let spec = parse(
        r#"{ "schema_version": 1, "devices": [
            { "name": "r1", "kind": "router",
              "interfaces": [ { "ip": "10.0.0.1", "mask": "24" } ] } ] }"#,
    );
    let mut world = NetWorld::default();
    assert!(matches!(
        build_scenario(&spec, &mut world),
        Err(ScenarioError::MissingInterfaceName(_))
    ));
}

#[test]
fn malformed_addresses_surface_as_typed_errors() {
    let spec = parse(
        r#"{ "schema_version": 1, "devices": [
            { "name": "pc1", "kind": "pc",
              "interfaces": [ { "ip": "999.0.0.1", "mask": "24" } ] } ] }"#,
    );
    let mut world = NetWorld::default();
    assert!(matches!(
        build_scenario(&spec, &mut world),
        Err(ScenarioError::Addr(_))
    ));
}

#[test]
fn double_cabling_a_port_is_rejected() {
    let spec = parse(
        r#"{ "schema_version": 1,
             "devices": [
               { "name": "pc1", "kind": "pc" },
               { "name": "pc2", "kind": "pc" },
               { "name": "pc3", "kind": "pc" } ],
             "cables": [
               { "a": "pc1:eth0", "b": "pc2:eth0" },
               { "a": "pc1:eth0", "b": "pc3:eth0" } ] }"#,
    );
    let mut world = NetWorld::default();
    assert!(matches!(
        build_scenario(&spec, &mut world),
        Err(ScenarioError::PortInUse(_, _))
    ));
}
