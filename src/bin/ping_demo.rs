//! 双子网 ping 演示
//!
//! PC1 -- 路由器 -- PC2 拓扑上的 ping 往返示例

use clap::Parser;
use netlab_rs::net::{DeviceTick, StartPing, NetWorld};
use netlab_rs::sim::{SimTime, Simulator};
use netlab_rs::topo::{build_pc_router_pc, PcRouterPcOpts};

#[derive(Debug, Parser)]
#[command(name = "ping-demo", about = "双子网拓扑仿真：pc1 ping pc2")]
struct Args {
    #[arg(long, default_value_t = 64)]
    ttl: u8,
    #[arg(long, default_value_t = 4)]
    count: u64,
    /// 两次 ping 的间隔（毫秒）
    #[arg(long, default_value_t = 1000)]
    gap_ms: u64,
    /// 仿真运行到多少毫秒
    #[arg(long, default_value_t = 20_000)]
    until_ms: u64,
}

fn main() {
    // 初始化 tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();

    let args = Args::parse();

    let mut sim = Simulator::default();
    let mut world = NetWorld::default();
    let topo = build_pc_router_pc(&mut world, &PcRouterPcOpts::default());

    // 周期驱动（ICMP 超时清理等）
    for dev in [topo.pc1, topo.pc2, topo.router] {
        sim.schedule(
            SimTime::ZERO,
            DeviceTick {
                device: dev,
                period: SimTime::from_secs(1),
            },
        );
    }

    for i in 0..args.count {
        sim.schedule(
            SimTime::from_millis(args.gap_ms.saturating_mul(i)),
            StartPing {
                host: topo.pc1,
                dst: topo.pc2_ip,
                ttl: args.ttl,
            },
        );
    }

    sim.run_until(SimTime::from_millis(args.until_ms), &mut world);

    let stats = *world
        .net
        .host_mut(topo.pc1)
        .expect("pc1 exists")
        .icmp()
        .stats();
    println!(
        "pc1 ping statistics: {} sent, {} replied, {} failed, {:.1}% loss",
        stats.sent,
        stats.replied,
        stats.failed,
        stats.loss_percent()
    );
    if let Some(rtt) = stats.avg_rtt() {
        println!("avg rtt: {} ns", rtt.0);
    }
    let r = world
        .net
        .router_mut(topo.router)
        .expect("router exists")
        .stats();
    println!(
        "router: received={} forwarded={} dropped={} ttl_expired={}",
        r.packets_received, r.packets_forwarded, r.packets_dropped, r.ttl_expired
    );
}
