//! 运维下发 handlers
//!
//! - POST /commands/typed      类型化段组帧下发（0x07/0x08/0x09）
//! - POST /commands/config-v2  参数配置下发 V2（dataId 查宽度）
//! - POST /commands/registers  写保持寄存器（单个 0x06 / 多个 0x10）
//!
//! 请求体 values 允许布尔/数字/字符串混填，按目标类型宽容转换，
//! 转换失败按 400 返回；网关未连接按 503 快速失败。

use crate::utils::response::{bad_request_error, protocol_error};
use crate::AppState;
use api_contract::{
    ApiResponse, ConfigFrameRequest, RegisterWriteRequest, SendReceipt, TypedFrameRequest,
};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use spraygw_protocol::{
    segment::{command_type, config_value_width},
    CommandSegment, ConfigItem, ConfigValue, OutboundCommand,
};

pub async fn send_typed_frame(
    State(state): State<AppState>,
    Json(req): Json<TypedFrameRequest>,
) -> Response {
    if req.segments.is_empty() {
        return bad_request_error("segments must not be empty");
    }

    let mut segments = Vec::with_capacity(req.segments.len());
    for dto in &req.segments {
        let segment = match dto.type_id {
            command_type::BOOL => {
                let values: Vec<bool> = dto.values.iter().map(coerce_bool).collect();
                CommandSegment::of_bools(&values)
            }
            command_type::INT16 => {
                let mut values = Vec::with_capacity(dto.values.len());
                for value in &dto.values {
                    match coerce_i16(value) {
                        Ok(v) => values.push(v),
                        Err(msg) => return bad_request_error(msg),
                    }
                }
                CommandSegment::of_int16(&values)
            }
            command_type::REAL32 => {
                let mut values = Vec::with_capacity(dto.values.len());
                for value in &dto.values {
                    match coerce_f64(value) {
                        Ok(v) => values.push(v),
                        Err(msg) => return bad_request_error(msg),
                    }
                }
                CommandSegment::of_real32(&values)
            }
            other => {
                return bad_request_error(format!(
                    "unsupported type id: 0x{:02x} (expected 0x07/0x08/0x09)",
                    other
                ))
            }
        };
        match segment {
            Ok(segment) => segments.push(segment),
            Err(err) => return protocol_error(err),
        }
    }

    let command = OutboundCommand::TypedSegments {
        function_code: req.function_code,
        start_address: req.start_address,
        segments,
    };
    match state.link.send_command(req.unit_id, &command).await {
        Ok(frame_len) => (
            StatusCode::OK,
            Json(ApiResponse::success(SendReceipt { frame_len })),
        )
            .into_response(),
        Err(err) => protocol_error(err),
    }
}

pub async fn send_config_frame(
    State(state): State<AppState>,
    Json(req): Json<ConfigFrameRequest>,
) -> Response {
    if req.items.is_empty() {
        return bad_request_error("items must not be empty");
    }

    let mut items = Vec::with_capacity(req.items.len());
    for dto in &req.items {
        let value = match config_value_width(dto.data_id) {
            Some(1) => match coerce_char_code(&dto.value) {
                Ok(code) => ConfigValue::CharCode(code),
                Err(msg) => return bad_request_error(msg),
            },
            Some(2) => match coerce_i16(&dto.value) {
                Ok(v) => ConfigValue::Int16(v),
                Err(msg) => return bad_request_error(msg),
            },
            Some(4) => match coerce_f64(&dto.value) {
                Ok(v) => ConfigValue::Real32(v),
                Err(msg) => return bad_request_error(msg),
            },
            _ => {
                return bad_request_error(format!(
                    "config data id 0x{:02x} out of range (0x01-0x13)",
                    dto.data_id
                ))
            }
        };
        match ConfigItem::new(dto.data_id, value) {
            Ok(item) => items.push(item),
            Err(err) => return protocol_error(err),
        }
    }

    let command = OutboundCommand::ConfigV2 {
        function_code: req.function_code,
        items,
    };
    match state.link.send_command(req.unit_id, &command).await {
        Ok(frame_len) => (
            StatusCode::OK,
            Json(ApiResponse::success(SendReceipt { frame_len })),
        )
            .into_response(),
        Err(err) => protocol_error(err),
    }
}

pub async fn send_register_write(
    State(state): State<AppState>,
    Json(req): Json<RegisterWriteRequest>,
) -> Response {
    let command = match req.values.as_slice() {
        [] => return bad_request_error("values must not be empty"),
        [value] => OutboundCommand::WriteSingleRegister {
            address: req.start_address,
            value: *value,
        },
        _ => OutboundCommand::WriteMultipleRegisters {
            start_address: req.start_address,
            values: req.values.clone(),
        },
    };
    match state.link.send_command(req.unit_id, &command).await {
        Ok(frame_len) => (
            StatusCode::OK,
            Json(ApiResponse::success(SendReceipt { frame_len })),
        )
            .into_response(),
        Err(err) => protocol_error(err),
    }
}

/// bool 宽容转换：布尔原样；数字非零为真；字符串 "0" 为假，其余为真。
fn coerce_bool(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().map(|v| v != 0.0).unwrap_or(false),
        serde_json::Value::String(s) => s != "0",
        _ => false,
    }
}

fn coerce_i16(value: &serde_json::Value) -> Result<i16, String> {
    let parsed = match value {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed
        .and_then(|v| i16::try_from(v).ok())
        .ok_or_else(|| format!("value {} is not a valid int16", value))
}

fn coerce_f64(value: &serde_json::Value) -> Result<f64, String> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| format!("value {} is not a valid real32", value))
}

/// 字符代号：数字 0–255，或取非空字符串的首字节。
fn coerce_char_code(value: &serde_json::Value) -> Result<u8, String> {
    match value {
        serde_json::Value::Number(n) => n
            .as_u64()
            .and_then(|v| u8::try_from(v).ok())
            .ok_or_else(|| format!("value {} is not a valid character code", value)),
        serde_json::Value::String(s) if !s.is_empty() => Ok(s.as_bytes()[0]),
        _ => Err(format!("value {} is not a valid character code", value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_coercion_accepts_mixed_inputs() {
        assert!(coerce_bool(&serde_json::json!(true)));
        assert!(coerce_bool(&serde_json::json!(1)));
        assert!(!coerce_bool(&serde_json::json!(0)));
        assert!(coerce_bool(&serde_json::json!("1")));
        assert!(!coerce_bool(&serde_json::json!("0")));
        assert!(!coerce_bool(&serde_json::json!(null)));
    }

    #[test]
    fn int16_coercion_bounds() {
        assert_eq!(coerce_i16(&serde_json::json!(-3)), Ok(-3));
        assert_eq!(coerce_i16(&serde_json::json!("42")), Ok(42));
        assert!(coerce_i16(&serde_json::json!(40000)).is_err());
        assert!(coerce_i16(&serde_json::json!("abc")).is_err());
    }

    #[test]
    fn char_code_coercion() {
        assert_eq!(coerce_char_code(&serde_json::json!(65)), Ok(65));
        assert_eq!(coerce_char_code(&serde_json::json!("A")), Ok(b'A'));
        assert!(coerce_char_code(&serde_json::json!(300)).is_err());
        assert!(coerce_char_code(&serde_json::json!("")).is_err());
    }
}
