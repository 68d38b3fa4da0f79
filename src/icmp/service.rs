//! 回显服务
//!
//! 每个目的地维持稳定的标识符与单调递增的序列号；挂起请求以
//! (目的地, 序列号) 为键，记录发出时刻与可配置超时（默认 5 秒）。
//! 不匹配的应答被忽略（迟到/伪造应答），匹配的应答计算 RTT 并
//! 更新统计。所有时间都来自仿真时钟。

use crate::addr::IpAddress;
use crate::sim::SimTime;
use std::collections::HashMap;
use tracing::{debug, trace};

/// 一次回显请求的句柄。
#[derive(Debug, Clone, Copy)]
pub struct EchoHandle {
    pub ident: u16,
    pub seq: u16,
}

/// 挂起中的回显请求。
#[derive(Debug, Clone, Copy)]
pub struct PendingEcho {
    pub ident: u16,
    pub sent_at: SimTime,
    pub timeout: SimTime,
}

/// 回显统计。
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoStats {
    pub sent: u64,
    pub replied: u64,
    pub failed: u64,
    rtt_sum_ns: u128,
}

impl EchoStats {
    /// 平均 RTT（无应答时为 None）。
    pub fn avg_rtt(&self) -> Option<SimTime> {
        if self.replied == 0 {
            return None;
        }
        Some(SimTime((self.rtt_sum_ns / self.replied as u128) as u64))
    }

    /// 已判定丢失的比例（挂起中的请求不计入）。
    pub fn loss_percent(&self) -> f64 {
        if self.sent == 0 {
            return 0.0;
        }
        self.failed as f64 / self.sent as f64 * 100.0
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EchoReplyEvent {
    pub peer: IpAddress,
    pub seq: u16,
    pub rtt: SimTime,
}

#[derive(Debug, Clone, Copy)]
pub struct EchoTimeoutEvent {
    pub peer: IpAddress,
    pub seq: u16,
}

#[derive(Debug, Clone, Copy)]
struct DestState {
    ident: u16,
    next_seq: u16,
}

/// 默认回显超时：5 秒。
pub const DEFAULT_ECHO_TIMEOUT: SimTime = SimTime(5_000_000_000);

pub struct IcmpService {
    next_ident: u16,
    dests: HashMap<IpAddress, DestState>,
    pending: HashMap<(IpAddress, u16), PendingEcho>,
    default_timeout: SimTime,
    stats: EchoStats,
    reply_cbs: Vec<Box<dyn FnMut(&EchoReplyEvent) + Send>>,
    timeout_cbs: Vec<Box<dyn FnMut(&EchoTimeoutEvent) + Send>>,
}

impl Default for IcmpService {
    fn default() -> Self {
        IcmpService::new()
    }
}

impl IcmpService {
    pub fn new() -> IcmpService {
        IcmpService::with_timeout(DEFAULT_ECHO_TIMEOUT)
    }

    pub fn with_timeout(default_timeout: SimTime) -> IcmpService {
        IcmpService {
            next_ident: 1,
            dests: HashMap::new(),
            pending: HashMap::new(),
            default_timeout,
            stats: EchoStats::default(),
            reply_cbs: Vec::new(),
            timeout_cbs: Vec::new(),
        }
    }

    /// 注册一次回显请求并返回其标识符/序列号。
    pub fn create_echo_request(&mut self, dst: IpAddress, now: SimTime) -> EchoHandle {
        let next_ident = &mut self.next_ident;
        let state = self.dests.entry(dst).or_insert_with(|| {
            let ident = *next_ident;
            *next_ident = next_ident.wrapping_add(1);
            DestState { ident, next_seq: 1 }
        });
        let seq = state.next_seq;
        state.next_seq = state.next_seq.wrapping_add(1);
        self.pending.insert(
            (dst, seq),
            PendingEcho {
                ident: state.ident,
                sent_at: now,
                timeout: self.default_timeout,
            },
        );
        self.stats.sent += 1;
        debug!(dst = %dst, ident = state.ident, seq, "登记回显请求");
        EchoHandle {
            ident: state.ident,
            seq,
        }
    }

    /// 处理回显应答。标识符或序列号不匹配的应答被忽略并返回 None。
    pub fn handle_echo_reply(
        &mut self,
        peer: IpAddress,
        ident: u16,
        seq: u16,
        now: SimTime,
    ) -> Option<EchoReplyEvent> {
        let entry = self.pending.get(&(peer, seq))?;
        if entry.ident != ident {
            trace!(peer = %peer, ident, seq, "标识符不匹配，忽略应答");
            return None;
        }
        let sent_at = entry.sent_at;
        self.pending.remove(&(peer, seq));
        let rtt = now.saturating_sub(sent_at);
        self.stats.replied += 1;
        self.stats.rtt_sum_ns += rtt.0 as u128;
        let ev = EchoReplyEvent { peer, seq, rtt };
        debug!(peer = %peer, seq, rtt_ns = rtt.0, "回显应答匹配");
        for cb in &mut self.reply_cbs {
            cb(&ev);
        }
        Some(ev)
    }

    /// 纯查询：返回已超时的挂起请求，不做任何修改。
    pub fn timed_out_requests(&self, now: SimTime) -> Vec<(IpAddress, u16)> {
        let mut out: Vec<(IpAddress, u16)> = self
            .pending
            .iter()
            .filter(|(_, p)| now.saturating_sub(p.sent_at) > p.timeout)
            .map(|(k, _)| *k)
            .collect();
        out.sort();
        out
    }

    /// 移除所有超时请求，逐个触发超时回调，返回移除数量。
    pub fn cleanup_timed_out(&mut self, now: SimTime) -> usize {
        let expired = self.timed_out_requests(now);
        for (peer, seq) in &expired {
            self.pending.remove(&(*peer, *seq));
            self.stats.failed += 1;
            let ev = EchoTimeoutEvent {
                peer: *peer,
                seq: *seq,
            };
            debug!(peer = %peer, seq, "回显请求超时");
            for cb in &mut self.timeout_cbs {
                cb(&ev);
            }
        }
        expired.len()
    }

    /// 发送失败时撤销挂起请求，立即计为丢失（显式可达性失败，而非超时）。
    pub fn fail_pending(&mut self, dst: IpAddress, seq: u16) {
        if self.pending.remove(&(dst, seq)).is_some() {
            self.stats.failed += 1;
        }
    }

    pub fn on_reply(&mut self, cb: Box<dyn FnMut(&EchoReplyEvent) + Send>) {
        self.reply_cbs.push(cb);
    }

    pub fn on_timeout(&mut self, cb: Box<dyn FnMut(&EchoTimeoutEvent) + Send>) {
        self.timeout_cbs.push(cb);
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn stats(&self) -> &EchoStats {
        &self.stats
    }
}
