//! 追踪与请求 ID 生成。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use tracing_subscriber::{fmt, EnvFilter};

/// 请求级追踪标识。
#[derive(Debug, Clone)]
pub struct RequestIds {
    pub request_id: String,
    pub trace_id: String,
}

/// 网关指标快照。
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsSnapshot {
    pub frames_received: u64,
    pub frames_acked: u64,
    pub frames_rejected: u64,
    pub decode_failures: u64,
    pub readings_written: u64,
    pub reading_write_failures: u64,
    pub alarms_emitted: u64,
    pub commands_sent: u64,
    pub command_send_failures: u64,
    pub reconnects: u64,
}

/// 网关指标计数器。
pub struct GatewayMetrics {
    frames_received: AtomicU64,
    frames_acked: AtomicU64,
    frames_rejected: AtomicU64,
    decode_failures: AtomicU64,
    readings_written: AtomicU64,
    reading_write_failures: AtomicU64,
    alarms_emitted: AtomicU64,
    commands_sent: AtomicU64,
    command_send_failures: AtomicU64,
    reconnects: AtomicU64,
}

impl GatewayMetrics {
    pub fn new() -> Self {
        Self {
            frames_received: AtomicU64::new(0),
            frames_acked: AtomicU64::new(0),
            frames_rejected: AtomicU64::new(0),
            decode_failures: AtomicU64::new(0),
            readings_written: AtomicU64::new(0),
            reading_write_failures: AtomicU64::new(0),
            alarms_emitted: AtomicU64::new(0),
            commands_sent: AtomicU64::new(0),
            command_send_failures: AtomicU64::new(0),
            reconnects: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            frames_received: self.frames_received.load(Ordering::Relaxed),
            frames_acked: self.frames_acked.load(Ordering::Relaxed),
            frames_rejected: self.frames_rejected.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            readings_written: self.readings_written.load(Ordering::Relaxed),
            reading_write_failures: self.reading_write_failures.load(Ordering::Relaxed),
            alarms_emitted: self.alarms_emitted.load(Ordering::Relaxed),
            commands_sent: self.commands_sent.load(Ordering::Relaxed),
            command_send_failures: self.command_send_failures.load(Ordering::Relaxed),
            reconnects: self.reconnects.load(Ordering::Relaxed),
        }
    }
}

impl Default for GatewayMetrics {
    fn default() -> Self {
        Self::new()
    }
}

static METRICS: OnceLock<GatewayMetrics> = OnceLock::new();

/// 获取全局指标实例。
pub fn metrics() -> &'static GatewayMetrics {
    METRICS.get_or_init(GatewayMetrics::new)
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

/// 记录接收到的帧数。
pub fn record_frame_received() {
    metrics().frames_received.fetch_add(1, Ordering::Relaxed);
}

/// 记录确认帧应答次数。
pub fn record_frame_acked() {
    metrics().frames_acked.fetch_add(1, Ordering::Relaxed);
}

/// 记录长度不一致被错误帧应答的次数。
pub fn record_frame_rejected() {
    metrics().frames_rejected.fetch_add(1, Ordering::Relaxed);
}

/// 记录帧/段解码失败次数。
pub fn record_decode_failure() {
    metrics().decode_failures.fetch_add(1, Ordering::Relaxed);
}

/// 记录读数入库成功次数。
pub fn record_reading_written() {
    metrics().readings_written.fetch_add(1, Ordering::Relaxed);
}

/// 记录读数入库失败次数。
pub fn record_reading_write_failure() {
    metrics()
        .reading_write_failures
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录报警事件推送条数。
pub fn record_alarms_emitted(count: u64) {
    metrics().alarms_emitted.fetch_add(count, Ordering::Relaxed);
}

/// 记录下发帧发送成功次数。
pub fn record_command_sent() {
    metrics().commands_sent.fetch_add(1, Ordering::Relaxed);
}

/// 记录下发帧发送失败次数。
pub fn record_command_send_failure() {
    metrics()
        .command_send_failures
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录网关连接重建次数。
pub fn record_reconnect() {
    metrics().reconnects.fetch_add(1, Ordering::Relaxed);
}
