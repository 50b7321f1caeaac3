//! 稳定的 DTO 与 API 响应契约。

use serde::{Deserialize, Serialize};

/// 标准 API 响应封装。
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

/// 失败响应的错误体。
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                code: code.into(),
                message: message.into(),
            }),
        }
    }
}

/// 类型化段请求项（typeId 固定：0x07-bool、0x08-int16、0x09-real32）。
///
/// values 允许布尔/数字/字符串混填，由 handler 按 typeId 宽容转换，
/// 与前端既有调用格式保持兼容。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedSegmentDto {
    pub type_id: u8,
    pub values: Vec<serde_json::Value>,
}

/// 类型化段组帧下发请求体。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedFrameRequest {
    pub unit_id: u8,
    pub function_code: u8,
    pub start_address: u16,
    pub segments: Vec<TypedSegmentDto>,
}

/// 参数配置下发 V2 请求项（dataId 决定值宽度，无类型标识）。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigItemDto {
    pub data_id: u8,
    pub value: serde_json::Value,
}

/// 参数配置下发 V2 请求体。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFrameRequest {
    pub unit_id: u8,
    pub function_code: u8,
    pub items: Vec<ConfigItemDto>,
}

/// 写保持寄存器请求体（单个值走 0x06，多个值走 0x10）。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterWriteRequest {
    pub unit_id: u8,
    pub start_address: u16,
    pub values: Vec<u16>,
}

/// 下发结果回执。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendReceipt {
    pub frame_len: usize,
}

/// 设备状态最新值返回结构。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceStatusDto {
    pub dev_name: String,
    pub status: i32,
    pub ts_ms: i64,
}

/// 传感器最新值返回结构。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorDto {
    pub dev_name: String,
    pub value: f32,
    pub ts_ms: i64,
}

/// 喷涂记录最新值返回结构。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SprayRecordDto {
    pub dev_name: String,
    pub rate: f64,
    pub ts_ms: i64,
}

/// 当日每时产量返回结构。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductHourlyDto {
    pub num_hourly: i32,
    pub ts_ms: i64,
}

/// 当月每周产量返回结构。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductWeekDto {
    pub num_weekly: i32,
    pub ts_ms: i64,
}

/// 网关指标快照返回结构。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayMetricsDto {
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

/// 报警推送项（SSE 与报警测试接口共用）。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmItemDto {
    pub device: String,
    pub index: usize,
    pub unit_id: u8,
    pub timestamp: i64,
}
