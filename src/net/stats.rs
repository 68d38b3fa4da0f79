//! 统计信息
//!
//! 链路层全局统计。

/// 网络级统计。
#[derive(Debug, Default)]
pub struct NetworkStats {
    pub frames_delivered: u64,
    /// 链路断开/设备断电导致的在途帧丢失。
    pub frames_lost: u64,
}
