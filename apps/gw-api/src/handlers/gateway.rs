//! 网关观测 handlers
//!
//! - GET /health
//! - GET /gateway/status      当前连接状态
//! - GET /gateway/last-frame  最近一帧的解析摘要

use crate::utils::response::not_found_error;
use crate::AppState;
use api_contract::ApiResponse;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "ok": true }))
}

pub async fn gateway_status(State(state): State<AppState>) -> Response {
    let connected = state.link.is_connected().await;
    (
        StatusCode::OK,
        Json(ApiResponse::success(
            serde_json::json!({ "connected": connected }),
        )),
    )
        .into_response()
}

pub async fn last_frame(State(state): State<AppState>) -> Response {
    match state.server.last_summary().await {
        Some(summary) => (StatusCode::OK, Json(ApiResponse::success(summary))).into_response(),
        None => not_found_error(),
    }
}
