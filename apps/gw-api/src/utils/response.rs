//! HTTP 响应辅助函数
//!
//! 提供统一的错误响应构造函数：
//! - bad_request_error / not_found_error / storage_error / protocol_error
//!
//! 设计原则：
//! - 所有错误返回统一的 ApiResponse 格式
//! - HTTP 状态码与错误码对应

use api_contract::ApiResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use spraygw_protocol::ProtocolError;
use spraygw_storage::StorageError;

/// 错误请求响应
pub fn bad_request_error(message: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::<()>::error("INVALID.REQUEST", message.into())),
    )
        .into_response()
}

/// 资源未找到错误响应
pub fn not_found_error() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::<()>::error("RESOURCE.NOT_FOUND", "not found")),
    )
        .into_response()
}

/// 存储错误响应
pub fn storage_error(err: StorageError) -> Response {
    let message = err.to_string();
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiResponse::<()>::error("INTERNAL.ERROR", message)),
    )
        .into_response()
}

/// 协议错误响应：未连接 503，组帧校验类 400，其余 500。
pub fn protocol_error(err: ProtocolError) -> Response {
    let (status, code) = match &err {
        ProtocolError::NotConnected => (StatusCode::SERVICE_UNAVAILABLE, "GATEWAY.NOT_CONNECTED"),
        ProtocolError::PayloadTooLarge(_)
        | ProtocolError::TooManyItems(_)
        | ProtocolError::DataParse(_) => (StatusCode::BAD_REQUEST, "INVALID.REQUEST"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL.ERROR"),
    };
    (
        status,
        Json(ApiResponse::<()>::error(code, err.to_string())),
    )
        .into_response()
}
