//! 帧投递事件
//!
//! 线缆把帧从一端送到另一端；到达时刻由线缆时延决定。事件携带
//! 发出时的线缆代数，线缆若已断开则投递确定性失败。

use super::frame::EthernetFrame;
use super::id::{CableId, PortRef};
use super::net_world::NetWorld;
use crate::sim::{Event, Simulator, World};
use tracing::trace;

/// 事件：把一帧交给目的端口所在设备处理。
#[derive(Debug)]
pub struct DeliverFrame {
    pub to: PortRef,
    pub cable: CableId,
    pub generation: u64,
    pub frame: EthernetFrame,
}

impl Event for DeliverFrame {
    #[tracing::instrument(skip(self, sim, world), fields(to = ?self.to, cable = ?self.cable))]
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let DeliverFrame {
            to,
            cable,
            generation,
            frame,
        } = *self;

        trace!(now = ?sim.now(), "📨 帧到达事件执行");

        let w = world
            .as_any_mut()
            .downcast_mut::<NetWorld>()
            .expect("world must be NetWorld");
        w.net.deliver(to, cable, generation, frame, sim);
    }
}
