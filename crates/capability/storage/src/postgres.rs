//! 读数 Postgres 存储实现
//!
//! 表结构与记录族一一对应（device_status / sensor / spray_record /
//! product_hourly / product_week），时间列为 timestamptz，写入用
//! `to_timestamp(ms / 1000.0)` 换算。

use crate::error::StorageError;
use crate::models::{
    DeviceStatusRecord, ProductHourlyRecord, ProductWeekRecord, SensorRecord, SprayRecordRow,
};
use crate::traits::ReadingStore;
use domain::Reading;
use sqlx::{PgPool, Row};

pub struct PgReadingStore {
    pub pool: PgPool,
}

impl PgReadingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let pool = crate::connection::connect_pool(database_url).await?;
        Ok(Self { pool })
    }
}

#[async_trait::async_trait]
impl ReadingStore for PgReadingStore {
    async fn insert_reading(&self, reading: &Reading) -> Result<(), StorageError> {
        match reading {
            Reading::DeviceStatus(ds) => {
                sqlx::query(
                    "insert into device_status (dev_name, status, ts) \
                     values ($1, $2, to_timestamp($3 / 1000.0))",
                )
                .bind(&ds.dev_name)
                .bind(if ds.active { 1i32 } else { 0i32 })
                .bind(ds.ts_ms as f64)
                .execute(&self.pool)
                .await?;
            }
            Reading::Sensor(s) => {
                sqlx::query(
                    "insert into sensor (dev_name, value, ts) \
                     values ($1, $2, to_timestamp($3 / 1000.0))",
                )
                .bind(&s.dev_name)
                .bind(s.value)
                .bind(s.ts_ms as f64)
                .execute(&self.pool)
                .await?;
            }
            Reading::Spray(sr) => {
                sqlx::query(
                    "insert into spray_record (dev_name, rate, ts) \
                     values ($1, $2, to_timestamp($3 / 1000.0))",
                )
                .bind(&sr.dev_name)
                .bind(sr.rate)
                .bind(sr.ts_ms as f64)
                .execute(&self.pool)
                .await?;
            }
            Reading::Production(p) => {
                if let Some(hourly) = p.hourly {
                    sqlx::query(
                        "insert into product_hourly (num_hourly, ts) \
                         values ($1, to_timestamp($2 / 1000.0))",
                    )
                    .bind(hourly)
                    .bind(p.ts_ms as f64)
                    .execute(&self.pool)
                    .await?;
                }
                if let Some(weekly) = p.weekly {
                    sqlx::query(
                        "insert into product_week (num_weekly, ts) \
                         values ($1, to_timestamp($2 / 1000.0))",
                    )
                    .bind(weekly)
                    .bind(p.ts_ms as f64)
                    .execute(&self.pool)
                    .await?;
                }
            }
        }
        Ok(())
    }

    async fn latest_device_status(
        &self,
        dev_name: &str,
    ) -> Result<Option<DeviceStatusRecord>, StorageError> {
        let row = sqlx::query(
            "select dev_name, status, (extract(epoch from ts) * 1000)::bigint as ts_ms \
             from device_status where dev_name = $1 order by ts desc limit 1",
        )
        .bind(dev_name)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|row| {
            Ok(DeviceStatusRecord {
                dev_name: row.try_get("dev_name")?,
                status: row.try_get("status")?,
                ts_ms: row.try_get("ts_ms")?,
            })
        })
        .transpose()
    }

    async fn latest_sensor(&self, dev_name: &str) -> Result<Option<SensorRecord>, StorageError> {
        let row = sqlx::query(
            "select dev_name, value, (extract(epoch from ts) * 1000)::bigint as ts_ms \
             from sensor where dev_name = $1 order by ts desc limit 1",
        )
        .bind(dev_name)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|row| {
            Ok(SensorRecord {
                dev_name: row.try_get("dev_name")?,
                value: row.try_get("value")?,
                ts_ms: row.try_get("ts_ms")?,
            })
        })
        .transpose()
    }

    async fn latest_spray_record(&self) -> Result<Option<SprayRecordRow>, StorageError> {
        let row = sqlx::query(
            "select dev_name, rate, (extract(epoch from ts) * 1000)::bigint as ts_ms \
             from spray_record order by ts desc limit 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        row.map(|row| {
            Ok(SprayRecordRow {
                dev_name: row.try_get("dev_name")?,
                rate: row.try_get("rate")?,
                ts_ms: row.try_get("ts_ms")?,
            })
        })
        .transpose()
    }

    async fn latest_product_hourly(&self) -> Result<Option<ProductHourlyRecord>, StorageError> {
        let row = sqlx::query(
            "select num_hourly, (extract(epoch from ts) * 1000)::bigint as ts_ms \
             from product_hourly order by ts desc limit 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        row.map(|row| {
            Ok(ProductHourlyRecord {
                num_hourly: row.try_get("num_hourly")?,
                ts_ms: row.try_get("ts_ms")?,
            })
        })
        .transpose()
    }

    async fn latest_product_week(&self) -> Result<Option<ProductWeekRecord>, StorageError> {
        let row = sqlx::query(
            "select num_weekly, (extract(epoch from ts) * 1000)::bigint as ts_ms \
             from product_week order by ts desc limit 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        row.map(|row| {
            Ok(ProductWeekRecord {
                num_weekly: row.try_get("num_weekly")?,
                ts_ms: row.try_get("ts_ms")?,
            })
        })
        .transpose()
    }
}
