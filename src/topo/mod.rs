//! 拓扑构建模块
//!
//! 经典教学拓扑的构建器与声明式场景（JSON）加载。

mod scenario;
mod two_subnet;

pub use scenario::{
    build_scenario, collect_ping_summaries, schedule_pings, BuiltScenario, CableSpec,
    DeviceKindSpec, DeviceSpec, IfaceSpec, PingSpec, PingSummary, ScenarioError, ScenarioMeta,
    ScenarioSpec, StaticRouteSpec,
};
pub use two_subnet::{build_pc_router_pc, PcRouterPc, PcRouterPcOpts};
