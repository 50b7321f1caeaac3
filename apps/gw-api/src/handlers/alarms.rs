//! 实时报警 handlers
//!
//! - GET /alarms/stream  SSE 报警流
//! - POST /alarms/test   报警推送测试

use crate::utils::response::bad_request_error;
use crate::AppState;
use api_contract::{AlarmItemDto, ApiResponse};
use axum::{
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use futures::stream::{self, Stream, StreamExt};
use std::convert::Infallible;
use tokio::sync::broadcast;

/// SSE 报警流：连接建立先发 `connected` 事件，之后每个报警批次一条。
pub async fn alarm_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.alarm_tx.subscribe();

    // 初始事件，方便前端确认连接建立
    let hello = Event::default()
        .json_data(serde_json::json!({
            "type": "connected",
            "timestamp": domain::now_epoch_ms(),
        }))
        .unwrap_or_else(|_| Event::default().data("connected"));

    let alarms = stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(items) => match Event::default().json_data(&items) {
                    Ok(event) => return Some((Ok::<_, Infallible>(event), rx)),
                    Err(_) => continue,
                },
                // 慢消费者丢过期批次，继续收新批次
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(stream::iter([Ok(hello)]).chain(alarms)).keep_alive(KeepAlive::default())
}

/// 报警推送测试：请求体原样广播到所有 SSE 订阅端。
pub async fn alarm_test(
    State(state): State<AppState>,
    Json(items): Json<Vec<AlarmItemDto>>,
) -> Response {
    if items.is_empty() {
        return bad_request_error("alarm batch must not be empty");
    }
    let _ = state.alarm_tx.send(items);
    (
        StatusCode::OK,
        Json(ApiResponse::success(serde_json::json!({ "ok": true }))),
    )
        .into_response()
}
