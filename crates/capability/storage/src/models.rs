//! 数据模型
//!
//! 定义最新值查询返回的行结构：
//! - 设备状态：DeviceStatusRecord
//! - 传感器：SensorRecord
//! - 喷涂记录：SprayRecordRow
//! - 产量：ProductHourlyRecord, ProductWeekRecord

/// 设备状态行。
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceStatusRecord {
    pub dev_name: String,
    /// 1 激活 / 0 非激活
    pub status: i32,
    pub ts_ms: i64,
}

/// 传感器模拟量行。
#[derive(Debug, Clone, PartialEq)]
pub struct SensorRecord {
    pub dev_name: String,
    pub value: f32,
    pub ts_ms: i64,
}

/// 喷涂记录行（含质量检测评分）。
#[derive(Debug, Clone, PartialEq)]
pub struct SprayRecordRow {
    pub dev_name: String,
    pub rate: f64,
    pub ts_ms: i64,
}

/// 当日每时产量行。
#[derive(Debug, Clone, PartialEq)]
pub struct ProductHourlyRecord {
    pub num_hourly: i32,
    pub ts_ms: i64,
}

/// 当月每周产量行。
#[derive(Debug, Clone, PartialEq)]
pub struct ProductWeekRecord {
    pub num_weekly: i32,
    pub ts_ms: i64,
}
