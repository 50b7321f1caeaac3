//! 最新读数查询 handlers
//!
//! - GET /device-status/latest?devName=
//! - GET /sensors/latest?devName=
//! - GET /spray-records/latest
//! - GET /production/hourly/latest
//! - GET /production/weekly/latest

use crate::utils::response::{not_found_error, storage_error};
use crate::AppState;
use api_contract::{
    ApiResponse, DeviceStatusDto, ProductHourlyDto, ProductWeekDto, SensorDto, SprayRecordDto,
};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

#[derive(serde::Deserialize)]
pub struct DevNameQuery {
    #[serde(alias = "devName")]
    pub dev_name: String,
}

pub async fn latest_device_status(
    State(state): State<AppState>,
    Query(query): Query<DevNameQuery>,
) -> Response {
    match state.store.latest_device_status(&query.dev_name).await {
        Ok(Some(record)) => (
            StatusCode::OK,
            Json(ApiResponse::success(DeviceStatusDto {
                dev_name: record.dev_name,
                status: record.status,
                ts_ms: record.ts_ms,
            })),
        )
            .into_response(),
        Ok(None) => not_found_error(),
        Err(err) => storage_error(err),
    }
}

pub async fn latest_sensor(
    State(state): State<AppState>,
    Query(query): Query<DevNameQuery>,
) -> Response {
    match state.store.latest_sensor(&query.dev_name).await {
        Ok(Some(record)) => (
            StatusCode::OK,
            Json(ApiResponse::success(SensorDto {
                dev_name: record.dev_name,
                value: record.value,
                ts_ms: record.ts_ms,
            })),
        )
            .into_response(),
        Ok(None) => not_found_error(),
        Err(err) => storage_error(err),
    }
}

pub async fn latest_spray_record(State(state): State<AppState>) -> Response {
    match state.store.latest_spray_record().await {
        Ok(Some(record)) => (
            StatusCode::OK,
            Json(ApiResponse::success(SprayRecordDto {
                dev_name: record.dev_name,
                rate: record.rate,
                ts_ms: record.ts_ms,
            })),
        )
            .into_response(),
        Ok(None) => not_found_error(),
        Err(err) => storage_error(err),
    }
}

pub async fn latest_product_hourly(State(state): State<AppState>) -> Response {
    match state.store.latest_product_hourly().await {
        Ok(Some(record)) => (
            StatusCode::OK,
            Json(ApiResponse::success(ProductHourlyDto {
                num_hourly: record.num_hourly,
                ts_ms: record.ts_ms,
            })),
        )
            .into_response(),
        Ok(None) => not_found_error(),
        Err(err) => storage_error(err),
    }
}

pub async fn latest_product_week(State(state): State<AppState>) -> Response {
    match state.store.latest_product_week().await {
        Ok(Some(record)) => (
            StatusCode::OK,
            Json(ApiResponse::success(ProductWeekDto {
                num_weekly: record.num_weekly,
                ts_ms: record.ts_ms,
            })),
        )
            .into_response(),
        Ok(None) => not_found_error(),
        Err(err) => storage_error(err),
    }
}
