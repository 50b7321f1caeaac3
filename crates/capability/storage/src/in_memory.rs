//! 读数内存存储实现
//!
//! 仅用于本地联调和测试。

use crate::error::StorageError;
use crate::models::{
    DeviceStatusRecord, ProductHourlyRecord, ProductWeekRecord, SensorRecord, SprayRecordRow,
};
use crate::traits::ReadingStore;
use domain::Reading;
use std::sync::RwLock;

/// 读数内存存储
#[derive(Default)]
pub struct InMemoryReadingStore {
    device_status: RwLock<Vec<DeviceStatusRecord>>,
    sensors: RwLock<Vec<SensorRecord>>,
    spray_records: RwLock<Vec<SprayRecordRow>>,
    product_hourly: RwLock<Vec<ProductHourlyRecord>>,
    product_week: RwLock<Vec<ProductWeekRecord>>,
}

impl InMemoryReadingStore {
    /// 创建空存储
    pub fn new() -> Self {
        Self::default()
    }

    /// 已入库的记录总数（用于测试）
    pub fn len(&self) -> usize {
        let counts = [
            self.device_status.read().map(|v| v.len()).unwrap_or(0),
            self.sensors.read().map(|v| v.len()).unwrap_or(0),
            self.spray_records.read().map(|v| v.len()).unwrap_or(0),
            self.product_hourly.read().map(|v| v.len()).unwrap_or(0),
            self.product_week.read().map(|v| v.len()).unwrap_or(0),
        ];
        counts.iter().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl ReadingStore for InMemoryReadingStore {
    async fn insert_reading(&self, reading: &Reading) -> Result<(), StorageError> {
        match reading {
            Reading::DeviceStatus(ds) => {
                let mut rows = self
                    .device_status
                    .write()
                    .map_err(|_| StorageError::new("lock failed"))?;
                rows.push(DeviceStatusRecord {
                    dev_name: ds.dev_name.clone(),
                    status: if ds.active { 1 } else { 0 },
                    ts_ms: ds.ts_ms,
                });
            }
            Reading::Sensor(s) => {
                let mut rows = self
                    .sensors
                    .write()
                    .map_err(|_| StorageError::new("lock failed"))?;
                rows.push(SensorRecord {
                    dev_name: s.dev_name.clone(),
                    value: s.value,
                    ts_ms: s.ts_ms,
                });
            }
            Reading::Spray(sr) => {
                let mut rows = self
                    .spray_records
                    .write()
                    .map_err(|_| StorageError::new("lock failed"))?;
                rows.push(SprayRecordRow {
                    dev_name: sr.dev_name.clone(),
                    rate: sr.rate,
                    ts_ms: sr.ts_ms,
                });
            }
            Reading::Production(p) => {
                // 产量记录按缺项拆入两张表
                if let Some(hourly) = p.hourly {
                    let mut rows = self
                        .product_hourly
                        .write()
                        .map_err(|_| StorageError::new("lock failed"))?;
                    rows.push(ProductHourlyRecord {
                        num_hourly: hourly,
                        ts_ms: p.ts_ms,
                    });
                }
                if let Some(weekly) = p.weekly {
                    let mut rows = self
                        .product_week
                        .write()
                        .map_err(|_| StorageError::new("lock failed"))?;
                    rows.push(ProductWeekRecord {
                        num_weekly: weekly,
                        ts_ms: p.ts_ms,
                    });
                }
            }
        }
        Ok(())
    }

    async fn latest_device_status(
        &self,
        dev_name: &str,
    ) -> Result<Option<DeviceStatusRecord>, StorageError> {
        let rows = self
            .device_status
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(rows
            .iter()
            .rev()
            .find(|row| row.dev_name == dev_name)
            .cloned())
    }

    async fn latest_sensor(&self, dev_name: &str) -> Result<Option<SensorRecord>, StorageError> {
        let rows = self
            .sensors
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(rows
            .iter()
            .rev()
            .find(|row| row.dev_name == dev_name)
            .cloned())
    }

    async fn latest_spray_record(&self) -> Result<Option<SprayRecordRow>, StorageError> {
        let rows = self
            .spray_records
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(rows.last().cloned())
    }

    async fn latest_product_hourly(&self) -> Result<Option<ProductHourlyRecord>, StorageError> {
        let rows = self
            .product_hourly
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(rows.last().cloned())
    }

    async fn latest_product_week(&self) -> Result<Option<ProductWeekRecord>, StorageError> {
        let rows = self
            .product_week
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(rows.last().cloned())
    }
}
