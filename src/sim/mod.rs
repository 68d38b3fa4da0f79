//! 仿真核心模块
//!
//! 事件驱动仿真的核心组件：虚拟时间、事件、世界与调度器。
//! 所有协议定时行为（Hello 间隔、失效定时器、ICMP 超时、LSA 老化）
//! 都以虚拟时间表达，测试可以确定性地推进时钟。

// 子模块声明
mod event;
mod scheduled_event;
mod simulator;
mod time;
mod world;

// 重新导出公共接口
pub use event::Event;
pub use scheduled_event::ScheduledEvent;
pub use simulator::Simulator;
pub use time::SimTime;
pub use world::World;
