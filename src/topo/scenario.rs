use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::addr::{AddrError, IpAddress, MacAddress, SubnetMask};
use crate::net::{Device, DeviceError, DeviceId, DeviceKind, NetWorld, StartPing};
use crate::sim::{SimTime, Simulator};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSpec {
    pub schema_version: u32,
    #[serde(default)]
    pub meta: Option<ScenarioMeta>,
    pub devices: Vec<DeviceSpec>,
    #[serde(default)]
    pub cables: Vec<CableSpec>,
    #[serde(default)]
    pub pings: Vec<PingSpec>,
    /// 省略时默认开启：按子网自动播种 ARP 表。
    #[serde(default)]
    pub auto_arp: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioMeta {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKindSpec {
    Pc,
    Hub,
    Switch,
    Router,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceSpec {
    pub name: String,
    pub kind: DeviceKindSpec,
    /// 集线器/交换机端口数（默认 8）。
    #[serde(default)]
    pub ports: Option<usize>,
    #[serde(default)]
    pub interfaces: Vec<IfaceSpec>,
    #[serde(default)]
    pub gateway: Option<String>,
    #[serde(default)]
    pub static_routes: Vec<StaticRouteSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IfaceSpec {
    /// PC 省略时为 eth0；路由器必填。
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub mask: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticRouteSpec {
    pub network: String,
    pub mask: String,
    pub next_hop: String,
    #[serde(default)]
    pub metric: Option<u32>,
}

/// 线缆两端，形如 `pc1:eth0`。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CableSpec {
    pub a: String,
    pub b: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingSpec {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub ttl: Option<u8>,
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default)]
    pub gap_ms: Option<u64>,
    #[serde(default)]
    pub start_ms: Option<u64>,
}

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error(transparent)]
    Addr(#[from] AddrError),
    #[error(transparent)]
    Device(#[from] DeviceError),
    #[error("duplicate device name: {0}")]
    DuplicateDevice(String),
    #[error("unknown device: {0}")]
    UnknownDevice(String),
    #[error("unknown port: {0}")]
    UnknownPort(String),
    #[error("bad cable endpoint (want dev:port): {0}")]
    BadEndpoint(String),
    #[error("ports already cabled: {0} <-> {1}")]
    PortInUse(String, String),
    #[error("router interface needs a name on {0}")]
    MissingInterfaceName(String),
}

/// 构建结果：设备名到标识的映射。
#[derive(Debug, Default)]
pub struct BuiltScenario {
    pub devices: BTreeMap<String, DeviceId>,
}

impl BuiltScenario {
    pub fn device(&self, name: &str) -> Option<DeviceId> {
        self.devices.get(name).copied()
    }
}

/// 按场景声明构建拓扑。
pub fn build_scenario(
    spec: &ScenarioSpec,
    world: &mut NetWorld,
) -> Result<BuiltScenario, ScenarioError> {
    let net = &mut world.net;
    let mut built = BuiltScenario::default();

    // 设备
    for dev in &spec.devices {
        if built.devices.contains_key(&dev.name) {
            return Err(ScenarioError::DuplicateDevice(dev.name.clone()));
        }
        let id = match dev.kind {
            DeviceKindSpec::Pc => net.add_pc(dev.name.clone()),
            DeviceKindSpec::Hub => net.add_hub(dev.name.clone(), dev.ports.unwrap_or(8)),
            DeviceKindSpec::Switch => net.add_switch(dev.name.clone(), dev.ports.unwrap_or(8)),
            DeviceKindSpec::Router => {
                let names: Vec<String> = dev
                    .interfaces
                    .iter()
                    .map(|i| {
                        i.name
                            .clone()
                            .ok_or_else(|| ScenarioError::MissingInterfaceName(dev.name.clone()))
                    })
                    .collect::<Result<_, _>>()?;
                let refs: Vec<&str> = names.iter().map(String::as_str).collect();
                net.add_router(dev.name.clone(), &refs)
            }
        };
        built.devices.insert(dev.name.clone(), id);
    }

    // 地址与路由
    for dev in &spec.devices {
        let id = built.devices[&dev.name];
        match dev.kind {
            DeviceKindSpec::Pc => {
                let host = net.host_mut(id).expect("added as pc");
                if let Some(iface) = dev.interfaces.first() {
                    if let (Some(ip), Some(mask)) = (&iface.ip, &iface.mask) {
                        host.configure_interface(
                            IpAddress::parse(ip)?,
                            SubnetMask::parse_any(mask)?,
                        );
                    }
                }
                if let Some(gw) = &dev.gateway {
                    host.set_default_gateway(IpAddress::parse(gw)?);
                }
            }
            DeviceKindSpec::Router => {
                for iface in &dev.interfaces {
                    let name = iface.name.as_deref().expect("validated above");
                    if let (Some(ip), Some(mask)) = (&iface.ip, &iface.mask) {
                        let ip = IpAddress::parse(ip)?;
                        let mask = SubnetMask::parse_any(mask)?;
                        net.router_mut(id)
                            .expect("added as router")
                            .configure_interface(name, ip, mask)?;
                    }
                }
            }
            _ => {}
        }
    }

    // 线缆
    for cable in &spec.cables {
        let a = resolve_endpoint(net, &built, &cable.a)?;
        let b = resolve_endpoint(net, &built, &cable.b)?;
        if net.connect(a, b).is_none() {
            return Err(ScenarioError::PortInUse(cable.a.clone(), cable.b.clone()));
        }
    }

    // 静态路由（在直连路由就位后）
    for dev in &spec.devices {
        if dev.kind != DeviceKindSpec::Router {
            continue;
        }
        let id = built.devices[&dev.name];
        for route in &dev.static_routes {
            let network = IpAddress::parse(&route.network)?;
            let mask = SubnetMask::parse_any(&route.mask)?;
            let next_hop = IpAddress::parse(&route.next_hop)?;
            net.router_mut(id)
                .expect("added as router")
                .add_static_route(network, mask, next_hop, route.metric.unwrap_or(1))?;
        }
    }

    if spec.auto_arp.unwrap_or(true) {
        seed_arp_tables(net, &built);
    }

    Ok(built)
}

/// 收集全部三层端点，按"同一子网可达"互相播种 ARP。
fn seed_arp_tables(net: &mut crate::net::Network, built: &BuiltScenario) {
    struct Endpoint {
        device: DeviceId,
        ip: IpAddress,
        mask: SubnetMask,
        mac: MacAddress,
    }
    let mut endpoints: Vec<Endpoint> = Vec::new();
    for id in built.devices.values() {
        let Some(dev) = net.device(*id) else { continue };
        if !matches!(dev.kind(), DeviceKind::Pc | DeviceKind::Router) {
            continue;
        }
        for port in dev.ports() {
            if let Some((ip, mask)) = port.ip {
                endpoints.push(Endpoint {
                    device: *id,
                    ip,
                    mask,
                    mac: port.mac,
                });
            }
        }
    }
    for i in 0..endpoints.len() {
        for j in 0..endpoints.len() {
            if i == j || endpoints[i].device == endpoints[j].device {
                continue;
            }
            let (a, b) = (&endpoints[i], &endpoints[j]);
            if !a.ip.same_subnet(&b.ip, &a.mask) {
                continue;
            }
            let (ip, mac) = (b.ip, b.mac);
            let dev = a.device;
            match net.device(dev).map(|d| d.kind()) {
                Some(DeviceKind::Pc) => {
                    if let Some(host) = net.host_mut(dev) {
                        host.add_arp_entry(ip, mac);
                    }
                }
                Some(DeviceKind::Router) => {
                    if let Some(router) = net.router_mut(dev) {
                        router.add_arp_entry(ip, mac);
                    }
                }
                _ => {}
            }
        }
    }
}

fn resolve_endpoint(
    net: &crate::net::Network,
    built: &BuiltScenario,
    endpoint: &str,
) -> Result<crate::net::PortRef, ScenarioError> {
    let (dev, port) = endpoint
        .split_once(':')
        .ok_or_else(|| ScenarioError::BadEndpoint(endpoint.to_string()))?;
    let id = built
        .device(dev)
        .ok_or_else(|| ScenarioError::UnknownDevice(dev.to_string()))?;
    net.port_ref(id, port)
        .ok_or_else(|| ScenarioError::UnknownPort(endpoint.to_string()))
}

/// 把场景中的 ping 序列调度到仿真器。
pub fn schedule_pings(
    spec: &ScenarioSpec,
    built: &BuiltScenario,
    sim: &mut Simulator,
) -> Result<(), ScenarioError> {
    for ping in &spec.pings {
        let host = built
            .device(&ping.from)
            .ok_or_else(|| ScenarioError::UnknownDevice(ping.from.clone()))?;
        let dst = IpAddress::parse(&ping.to)?;
        let ttl = ping.ttl.unwrap_or(64);
        let count = ping.count.unwrap_or(1) as u64;
        let gap = SimTime::from_millis(ping.gap_ms.unwrap_or(1000));
        let start = SimTime::from_millis(ping.start_ms.unwrap_or(0));
        for i in 0..count {
            sim.schedule(
                SimTime(start.0.saturating_add(gap.0.saturating_mul(i))),
                StartPing { host, dst, ttl },
            );
        }
    }
    Ok(())
}

/// 一台 PC 的 ping 汇总（JSON 输出用）。
#[derive(Debug, Clone, Serialize)]
pub struct PingSummary {
    pub host: String,
    pub sent: u64,
    pub replied: u64,
    pub failed: u64,
    pub avg_rtt_ns: Option<u64>,
    pub loss_percent: f64,
}

/// 收集全部 PC 的 ping 统计。
pub fn collect_ping_summaries(world: &mut NetWorld, built: &BuiltScenario) -> Vec<PingSummary> {
    let mut out = Vec::new();
    for (name, id) in &built.devices {
        if let Some(host) = world.net.host_mut(*id) {
            let stats = *host.icmp().stats();
            out.push(PingSummary {
                host: name.clone(),
                sent: stats.sent,
                replied: stats.replied,
                failed: stats.failed,
                avg_rtt_ns: stats.avg_rtt().map(|t| t.0),
                loss_percent: stats.loss_percent(),
            });
        }
    }
    out
}
