//! 双子网教学拓扑
//!
//! PC1 —— 路由器 —— PC2，两侧各一个 /24 子网。ARP 表按简化
//! 模型预先播种（不做动态解析）。

use crate::addr::{IpAddress, SubnetMask};
use crate::net::{Device, DeviceId, NetWorld};

/// 拓扑配置选项
#[derive(Debug, Clone)]
pub struct PcRouterPcOpts {
    pub pc1_ip: IpAddress,
    pub pc2_ip: IpAddress,
    pub r_left_ip: IpAddress,
    pub r_right_ip: IpAddress,
    pub mask: SubnetMask,
}

impl Default for PcRouterPcOpts {
    fn default() -> Self {
        PcRouterPcOpts {
            pc1_ip: IpAddress::new(192, 168, 1, 10),
            pc2_ip: IpAddress::new(192, 168, 2, 10),
            r_left_ip: IpAddress::new(192, 168, 1, 1),
            r_right_ip: IpAddress::new(192, 168, 2, 1),
            mask: SubnetMask::from_prefix_len(24).expect("valid prefix"),
        }
    }
}

/// 构建结果句柄
#[derive(Debug, Clone, Copy)]
pub struct PcRouterPc {
    pub pc1: DeviceId,
    pub pc2: DeviceId,
    pub router: DeviceId,
    pub pc1_ip: IpAddress,
    pub pc2_ip: IpAddress,
}

/// 构建拓扑：pc1 <-> r(gi0/0, gi0/1) <-> pc2
pub fn build_pc_router_pc(world: &mut NetWorld, opts: &PcRouterPcOpts) -> PcRouterPc {
    let net = &mut world.net;
    let pc1 = net.add_pc("pc1");
    let pc2 = net.add_pc("pc2");
    let router = net.add_router("r1", &["gi0/0", "gi0/1"]);

    let pc1_mac = net.host_mut(pc1).expect("pc1").mac();
    let pc2_mac = net.host_mut(pc2).expect("pc2").mac();
    let r_ports = net.device(router).expect("router").ports();
    let r_left_mac = r_ports[0].mac;
    let r_right_mac = r_ports[1].mac;

    {
        let h = net.host_mut(pc1).expect("pc1");
        h.configure_interface(opts.pc1_ip, opts.mask);
        h.set_default_gateway(opts.r_left_ip);
        h.add_arp_entry(opts.r_left_ip, r_left_mac);
    }
    {
        let h = net.host_mut(pc2).expect("pc2");
        h.configure_interface(opts.pc2_ip, opts.mask);
        h.set_default_gateway(opts.r_right_ip);
        h.add_arp_entry(opts.r_right_ip, r_right_mac);
    }
    {
        let r = net.router_mut(router).expect("router");
        r.configure_interface("gi0/0", opts.r_left_ip, opts.mask)
            .expect("gi0/0 exists");
        r.configure_interface("gi0/1", opts.r_right_ip, opts.mask)
            .expect("gi0/1 exists");
        r.add_arp_entry(opts.pc1_ip, pc1_mac);
        r.add_arp_entry(opts.pc2_ip, pc2_mac);
    }

    let a = net.port_ref(pc1, "eth0").expect("pc1 eth0");
    let b = net.port_ref(router, "gi0/0").expect("gi0/0");
    net.connect(a, b).expect("pc1 link");
    let c = net.port_ref(pc2, "eth0").expect("pc2 eth0");
    let d = net.port_ref(router, "gi0/1").expect("gi0/1");
    net.connect(c, d).expect("pc2 link");

    PcRouterPc {
        pc1,
        pc2,
        router,
        pc1_ip: opts.pc1_ip,
        pc2_ip: opts.pc2_ip,
    }
}
