//! 存储接口 Trait 定义
//!
//! 定义读数存储的异步接口：一次写入一条读数记录，按记录族查询
//! 最新值（管理 API 使用）。
//!
//! 设计原则：
//! - 所有接口返回 StorageError
//! - 使用 async_trait 支持动态分发

use crate::error::StorageError;
use crate::models::{
    DeviceStatusRecord, ProductHourlyRecord, ProductWeekRecord, SensorRecord, SprayRecordRow,
};
use async_trait::async_trait;
use domain::Reading;

/// 读数存储接口
///
/// 入库一次一条（单条失败不影响调用方批内其余记录），最新值查询
/// 按时间倒序取第一条。
#[async_trait]
pub trait ReadingStore: Send + Sync {
    /// 写入一条读数记录
    async fn insert_reading(&self, reading: &Reading) -> Result<(), StorageError>;

    /// 查询指定设备的最新状态
    async fn latest_device_status(
        &self,
        dev_name: &str,
    ) -> Result<Option<DeviceStatusRecord>, StorageError>;

    /// 查询指定传感器的最新值
    async fn latest_sensor(&self, dev_name: &str) -> Result<Option<SensorRecord>, StorageError>;

    /// 查询最新喷涂记录
    async fn latest_spray_record(&self) -> Result<Option<SprayRecordRow>, StorageError>;

    /// 查询最新当日每时产量
    async fn latest_product_hourly(&self) -> Result<Option<ProductHourlyRecord>, StorageError>;

    /// 查询最新当月每周产量
    async fn latest_product_week(&self) -> Result<Option<ProductWeekRecord>, StorageError>;
}
