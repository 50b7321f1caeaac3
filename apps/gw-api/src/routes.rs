//! 路由定义
//!
//! 集中管理所有 API 路由，将路径映射到对应的 handlers。
//! 路由包括：
//! - 健康检查：/health
//! - 实时报警：/alarms/stream（SSE）, /alarms/test
//! - 最新值查询：/device-status/latest, /sensors/latest,
//!   /spray-records/latest, /production/hourly/latest,
//!   /production/weekly/latest
//! - 运维下发：/commands/typed, /commands/config-v2, /commands/registers
//! - 网关观测：/gateway/status, /gateway/last-frame, /metrics

use super::handlers::*;
use super::AppState;
use axum::{
    routing::{get, post},
    Router,
};

/// 创建 API 路由
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/alarms/stream", get(alarm_stream))
        .route("/alarms/test", post(alarm_test))
        .route("/device-status/latest", get(latest_device_status))
        .route("/sensors/latest", get(latest_sensor))
        .route("/spray-records/latest", get(latest_spray_record))
        .route("/production/hourly/latest", get(latest_product_hourly))
        .route("/production/weekly/latest", get(latest_product_week))
        .route("/commands/typed", post(send_typed_frame))
        .route("/commands/config-v2", post(send_config_frame))
        .route("/commands/registers", post(send_register_write))
        .route("/gateway/status", get(gateway_status))
        .route("/gateway/last-frame", get(last_frame))
        .route("/metrics", get(get_metrics))
}
