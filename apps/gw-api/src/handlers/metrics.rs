//! 网关指标快照
//!
//! - GET /metrics

use api_contract::{ApiResponse, GatewayMetricsDto};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use spraygw_telemetry::metrics;

pub async fn get_metrics() -> Response {
    let snapshot = metrics().snapshot();
    (
        StatusCode::OK,
        Json(ApiResponse::success(GatewayMetricsDto {
            frames_received: snapshot.frames_received,
            frames_acked: snapshot.frames_acked,
            frames_rejected: snapshot.frames_rejected,
            decode_failures: snapshot.decode_failures,
            readings_written: snapshot.readings_written,
            reading_write_failures: snapshot.reading_write_failures,
            alarms_emitted: snapshot.alarms_emitted,
            commands_sent: snapshot.commands_sent,
            command_send_failures: snapshot.command_send_failures,
            reconnects: snapshot.reconnects,
        })),
    )
        .into_response()
}
