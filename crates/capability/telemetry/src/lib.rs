//! 追踪、请求 ID 生成与进程级计数器。

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::{EnvFilter, fmt};

/// 请求级追踪标识。
#[derive(Debug, Clone)]
pub struct RequestIds {
    pub request_id: String,
    pub trace_id: String,
}

/// 计数器快照。
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsSnapshot {
    pub cycles_opened: u64,
    pub cycles_rejected: u64,
    pub cycle_latency_ms_total: u64,
    pub cycle_latency_ms_count: u64,
    pub messages_published: u64,
    pub publish_failures: u64,
    pub unsubscribes_scheduled: u64,
    pub unsubscribes_cancelled: u64,
    pub unsubscribes_executed: u64,
    pub registry_reload_failures: u64,
    pub channel_values_dispatched: u64,
}

/// 进程级计数器。
pub struct TelemetryMetrics {
    cycles_opened: AtomicU64,
    cycles_rejected: AtomicU64,
    cycle_latency_ms_total: AtomicU64,
    cycle_latency_ms_count: AtomicU64,
    messages_published: AtomicU64,
    publish_failures: AtomicU64,
    unsubscribes_scheduled: AtomicU64,
    unsubscribes_cancelled: AtomicU64,
    unsubscribes_executed: AtomicU64,
    registry_reload_failures: AtomicU64,
    channel_values_dispatched: AtomicU64,
}

impl TelemetryMetrics {
    pub fn new() -> Self {
        Self {
            cycles_opened: AtomicU64::new(0),
            cycles_rejected: AtomicU64::new(0),
            cycle_latency_ms_total: AtomicU64::new(0),
            cycle_latency_ms_count: AtomicU64::new(0),
            messages_published: AtomicU64::new(0),
            publish_failures: AtomicU64::new(0),
            unsubscribes_scheduled: AtomicU64::new(0),
            unsubscribes_cancelled: AtomicU64::new(0),
            unsubscribes_executed: AtomicU64::new(0),
            registry_reload_failures: AtomicU64::new(0),
            channel_values_dispatched: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            cycles_opened: self.cycles_opened.load(Ordering::Relaxed),
            cycles_rejected: self.cycles_rejected.load(Ordering::Relaxed),
            cycle_latency_ms_total: self.cycle_latency_ms_total.load(Ordering::Relaxed),
            cycle_latency_ms_count: self.cycle_latency_ms_count.load(Ordering::Relaxed),
            messages_published: self.messages_published.load(Ordering::Relaxed),
            publish_failures: self.publish_failures.load(Ordering::Relaxed),
            unsubscribes_scheduled: self.unsubscribes_scheduled.load(Ordering::Relaxed),
            unsubscribes_cancelled: self.unsubscribes_cancelled.load(Ordering::Relaxed),
            unsubscribes_executed: self.unsubscribes_executed.load(Ordering::Relaxed),
            registry_reload_failures: self.registry_reload_failures.load(Ordering::Relaxed),
            channel_values_dispatched: self.channel_values_dispatched.load(Ordering::Relaxed),
        }
    }
}

impl Default for TelemetryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

static METRICS: OnceLock<TelemetryMetrics> = OnceLock::new();

/// 获取全局计数器实例。
pub fn metrics() -> &'static TelemetryMetrics {
    METRICS.get_or_init(TelemetryMetrics::new)
}

/// 初始化 tracing（默认 info）。
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

/// 生成新的 request_id 与 trace_id。
pub fn new_request_ids() -> RequestIds {
    RequestIds {
        request_id: uuid::Uuid::new_v4().to_string(),
        trace_id: uuid::Uuid::new_v4().to_string(),
    }
}

/// 记录抓取周期打开次数。
pub fn record_cycle_opened() {
    metrics().cycles_opened.fetch_add(1, Ordering::Relaxed);
}

/// 记录因用户未启用而被拒绝的周期。
pub fn record_cycle_rejected() {
    metrics().cycles_rejected.fetch_add(1, Ordering::Relaxed);
}

/// 记录一次完整周期耗时（毫秒，打开到关闭）。
pub fn record_cycle_latency_ms(latency_ms: u64) {
    let metrics = metrics();
    metrics
        .cycle_latency_ms_total
        .fetch_add(latency_ms, Ordering::Relaxed);
    metrics
        .cycle_latency_ms_count
        .fetch_add(1, Ordering::Relaxed);
}

pub fn record_message_published() {
    metrics().messages_published.fetch_add(1, Ordering::Relaxed);
}

pub fn record_publish_failure() {
    metrics().publish_failures.fetch_add(1, Ordering::Relaxed);
}

pub fn record_unsubscribe_scheduled() {
    metrics()
        .unsubscribes_scheduled
        .fetch_add(1, Ordering::Relaxed);
}

pub fn record_unsubscribe_cancelled() {
    metrics()
        .unsubscribes_cancelled
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录宽限期到期后实际执行的退订。
pub fn record_unsubscribe_executed() {
    metrics()
        .unsubscribes_executed
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录通道注册表重载失败（数据库不可达，保留旧内容）。
pub fn record_registry_reload_failure() {
    metrics()
        .registry_reload_failures
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录交给设备 RPC 的通道写命令。
pub fn record_channel_value_dispatched() {
    metrics()
        .channel_values_dispatched
        .fetch_add(1, Ordering::Relaxed);
}
