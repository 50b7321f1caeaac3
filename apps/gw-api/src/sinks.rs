//! 协议协作者与存储/推送通道的桥接实现。

use api_contract::AlarmItemDto;
use async_trait::async_trait;
use domain::{AlarmEvent, Reading};
use spraygw_protocol::{AlarmSink, ProtocolError, ReadingSink};
use spraygw_storage::ReadingStore;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::info;

/// 把解释器产出的读数逐条写入读数存储。
pub struct StoreReadingSink {
    store: Arc<dyn ReadingStore>,
}

impl StoreReadingSink {
    pub fn new(store: Arc<dyn ReadingStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ReadingSink for StoreReadingSink {
    async fn store(&self, reading: Reading) -> Result<(), ProtocolError> {
        self.store
            .insert_reading(&reading)
            .await
            .map_err(|e| ProtocolError::Collaborator(e.to_string()))
    }
}

/// 把报警事件批次广播给所有 SSE 订阅端。
///
/// 无订阅端时只打印日志，不视为失败（与前端是否在线解耦）。
pub struct BroadcastAlarmSink {
    tx: broadcast::Sender<Vec<AlarmItemDto>>,
}

impl BroadcastAlarmSink {
    pub fn new(tx: broadcast::Sender<Vec<AlarmItemDto>>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl AlarmSink for BroadcastAlarmSink {
    async fn notify(&self, events: Vec<AlarmEvent>) -> Result<(), ProtocolError> {
        let items: Vec<AlarmItemDto> = events
            .into_iter()
            .map(|event| AlarmItemDto {
                device: event.device,
                index: event.bit_index,
                unit_id: event.unit_id,
                timestamp: event.ts_ms,
            })
            .collect();
        for item in &items {
            info!(
                device = %item.device,
                index = item.index,
                unit = item.unit_id,
                "alarm triggered"
            );
        }
        let _ = self.tx.send(items);
        Ok(())
    }
}
