//! 帧解释器：解码遥测段并路由到存储/通知协作者
//!
//! 一帧的处理分三步：报警派生、读数路由、质量检测轮询。三步相互
//! 隔离，任何一步失败只记日志，不影响其余步骤，也不会中断接收循环。

use crate::error::ProtocolError;
use crate::frame::MbapHeader;
use crate::segment::{self, telemetry_type};
use async_trait::async_trait;
use domain::{
    names, now_epoch_ms, AlarmEvent, DeviceStatusReading, ProductionReading, Reading,
    SensorReading, SprayReading,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// 读数存储协作者：一次接收一条读数记录。
#[async_trait]
pub trait ReadingSink: Send + Sync {
    async fn store(&self, reading: Reading) -> Result<(), ProtocolError>;
}

/// 报警通知协作者：接收非空报警事件批次。
#[async_trait]
pub trait AlarmSink: Send + Sync {
    async fn notify(&self, events: Vec<AlarmEvent>) -> Result<(), ProtocolError>;
}

/// 质量检测评分协作者：每帧处理后轮询一次，结果按喷涂记录入库。
#[async_trait]
pub trait QualityProbe: Send + Sync {
    async fn fetch(&self) -> Result<Option<SprayReading>, ProtocolError>;
}

/// 空质量检测探针（未配置外部评分接口时使用）。
#[derive(Debug, Default)]
pub struct NoopQualityProbe;

#[async_trait]
impl QualityProbe for NoopQualityProbe {
    async fn fetch(&self) -> Result<Option<SprayReading>, ProtocolError> {
        Ok(None)
    }
}

/// 帧解析摘要（便于接口验证与观测）。
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameSummary {
    pub transaction_id: u16,
    pub protocol_id: u16,
    pub mbap_length: u16,
    pub unit_id: u8,
    pub function_code: u8,
    pub data_len: usize,
    pub decoded_types: Vec<u8>,
    pub decoded_values: BTreeMap<u8, Vec<i64>>,
}

/// 从解码结果派生报警事件：每个置位 bit 一条。
pub fn derive_alarm_events(
    decoded: &BTreeMap<u8, Vec<i64>>,
    unit_id: u8,
    ts_ms: i64,
) -> Vec<AlarmEvent> {
    let Some(alarms) = decoded.get(&telemetry_type::ALARM) else {
        return Vec::new();
    };
    alarms
        .iter()
        .enumerate()
        .filter(|(_, bit)| **bit > 0)
        .map(|(index, _)| AlarmEvent {
            device: names::alarm_device_name(index),
            bit_index: index,
            unit_id,
            ts_ms,
        })
        .collect()
}

/// 从解码结果构造读数记录列表（入库顺序与上报顺序一致）。
pub fn build_readings(decoded: &BTreeMap<u8, Vec<i64>>, ts_ms: i64) -> Vec<Reading> {
    let mut readings = Vec::new();

    // 0x01 设备状态
    if let Some(statuses) = decoded.get(&telemetry_type::DEVICE_STATUS) {
        for (index, value) in statuses.iter().enumerate() {
            readings.push(Reading::DeviceStatus(DeviceStatusReading {
                dev_name: names::device_status_name(index),
                active: *value > 0,
                ts_ms,
            }));
        }
    }

    // 0x02 传感器：按 REAL32 原始位模式还原
    if let Some(sensors) = decoded.get(&telemetry_type::SENSOR) {
        for (index, bits) in sensors.iter().enumerate() {
            readings.push(Reading::Sensor(SensorReading {
                dev_name: names::sensor_name(index),
                value: f32::from_bits(*bits as u32),
                ts_ms,
            }));
        }
    }

    // 0x03 喷涂记录
    if let Some(sprays) = decoded.get(&telemetry_type::SPRAY) {
        for (index, value) in sprays.iter().enumerate() {
            readings.push(Reading::Spray(SprayReading {
                dev_name: names::spray_name(index),
                rate: *value as f64,
                ts_ms,
            }));
        }
    }

    // 0x04 产量：index 0 = 当日每时，index 1 = 当月每周，允许缺项
    if let Some(production) = decoded.get(&telemetry_type::PRODUCTION) {
        if !production.is_empty() {
            readings.push(Reading::Production(ProductionReading {
                hourly: production.first().map(|value| *value as i32),
                weekly: production.get(1).map(|value| *value as i32),
                ts_ms,
            }));
        }
    }

    readings
}

/// 帧解释器：持有三个协作者引用。
pub struct FrameInterpreter {
    readings: Arc<dyn ReadingSink>,
    alarms: Arc<dyn AlarmSink>,
    quality: Arc<dyn QualityProbe>,
}

impl FrameInterpreter {
    pub fn new(
        readings: Arc<dyn ReadingSink>,
        alarms: Arc<dyn AlarmSink>,
        quality: Arc<dyn QualityProbe>,
    ) -> Self {
        Self {
            readings,
            alarms,
            quality,
        }
    }

    /// 解码一帧并完成报警派生、读数路由与质量检测轮询。
    ///
    /// PDU 必须完整（声明数据长度与实际一致由传输层先行校验），
    /// 否则返回 [`ProtocolError::LengthMismatch`]。
    pub async fn handle_frame(
        &self,
        header: &MbapHeader,
        pdu: &[u8],
    ) -> Result<FrameSummary, ProtocolError> {
        if pdu.len() < 3 {
            return Err(ProtocolError::DataParse(
                "pdu shorter than function code + data length".to_string(),
            ));
        }
        let function_code = pdu[0];
        let data_len = u16::from_be_bytes([pdu[1], pdu[2]]) as usize;
        if pdu.len() < 3 + data_len {
            return Err(ProtocolError::LengthMismatch {
                declared: data_len,
                actual: pdu.len() - 3,
            });
        }

        let decoded = segment::decode_segments(&pdu[3..3 + data_len]);
        debug!(
            unit = header.unit_id,
            types = ?decoded.keys().collect::<Vec<_>>(),
            "decoded telemetry segments"
        );
        let ts_ms = now_epoch_ms();

        // 报警处理：失败不阻断后续入库
        let events = derive_alarm_events(&decoded, header.unit_id, ts_ms);
        if !events.is_empty() {
            let count = events.len() as u64;
            match self.alarms.notify(events).await {
                Ok(()) => spraygw_telemetry::record_alarms_emitted(count),
                Err(e) => warn!(error = %e, "failed to notify alarm events"),
            }
        }

        // 读数路由：单条失败只记日志，继续处理批内其余读数
        for reading in build_readings(&decoded, ts_ms) {
            let kind = reading.kind();
            match self.readings.store(reading).await {
                Ok(()) => spraygw_telemetry::record_reading_written(),
                Err(e) => {
                    spraygw_telemetry::record_reading_write_failure();
                    warn!(kind, error = %e, "failed to store reading");
                }
            }
        }

        // 质量检测轮询：与帧内容无关，结果按喷涂记录入库
        match self.quality.fetch().await {
            Ok(Some(score)) => {
                if let Err(e) = self.readings.store(Reading::Spray(score)).await {
                    warn!(error = %e, "failed to store quality score");
                }
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "quality probe failed"),
        }

        Ok(FrameSummary {
            transaction_id: header.transaction_id,
            protocol_id: header.protocol_id,
            mbap_length: header.length,
            unit_id: header.unit_id,
            function_code,
            data_len,
            decoded_types: decoded.keys().copied().collect(),
            decoded_values: decoded,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        readings: Mutex<Vec<Reading>>,
        fail_sensors: bool,
    }

    #[async_trait]
    impl ReadingSink for RecordingSink {
        async fn store(&self, reading: Reading) -> Result<(), ProtocolError> {
            if self.fail_sensors && matches!(reading, Reading::Sensor(_)) {
                return Err(ProtocolError::Collaborator("forced failure".to_string()));
            }
            self.readings.lock().await.push(reading);
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingAlarms {
        batches: Mutex<Vec<Vec<AlarmEvent>>>,
    }

    #[async_trait]
    impl AlarmSink for RecordingAlarms {
        async fn notify(&self, events: Vec<AlarmEvent>) -> Result<(), ProtocolError> {
            self.batches.lock().await.push(events);
            Ok(())
        }
    }

    fn interpreter(
        sink: Arc<RecordingSink>,
        alarms: Arc<RecordingAlarms>,
    ) -> FrameInterpreter {
        FrameInterpreter::new(sink, alarms, Arc::new(NoopQualityProbe))
    }

    fn header_for(pdu_len: usize, unit_id: u8) -> MbapHeader {
        MbapHeader {
            transaction_id: 0x0001,
            protocol_id: 0x0000,
            length: (pdu_len + 1) as u16,
            unit_id,
        }
    }

    fn telemetry_pdu(content: &[u8]) -> Vec<u8> {
        let mut pdu = vec![0x03];
        pdu.extend_from_slice(&(content.len() as u16).to_be_bytes());
        pdu.extend_from_slice(content);
        pdu
    }

    #[test]
    fn alarm_bits_map_to_named_events() {
        let mut decoded = BTreeMap::new();
        decoded.insert(0x00u8, vec![0i64, 1, 0, 0, 1]);
        let events = derive_alarm_events(&decoded, 1, 1000);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].bit_index, 1);
        assert_eq!(events[0].device, "停止器2");
        assert_eq!(events[1].bit_index, 4);
        assert_eq!(events[1].device, "机器人1地轨");
        assert_eq!(events[0].unit_id, 1);
    }

    #[test]
    fn all_zero_alarm_bits_emit_nothing() {
        let mut decoded = BTreeMap::new();
        decoded.insert(0x00u8, vec![0i64; 17]);
        assert!(derive_alarm_events(&decoded, 1, 1000).is_empty());
    }

    #[test]
    fn out_of_table_bit_synthesizes_device_name() {
        let mut decoded = BTreeMap::new();
        let mut bits = vec![0i64; 18];
        bits[17] = 1;
        decoded.insert(0x00u8, bits);
        let events = derive_alarm_events(&decoded, 2, 1000);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].device, "报警设备18");
    }

    #[test]
    fn production_values_split_hourly_weekly() {
        let mut decoded = BTreeMap::new();
        decoded.insert(0x04u8, vec![30i64, 210]);
        let readings = build_readings(&decoded, 1000);
        assert_eq!(readings.len(), 1);
        match &readings[0] {
            Reading::Production(p) => {
                assert_eq!(p.hourly, Some(30));
                assert_eq!(p.weekly, Some(210));
            }
            other => panic!("unexpected reading: {:?}", other),
        }
    }

    #[test]
    fn production_single_value_leaves_weekly_absent() {
        let mut decoded = BTreeMap::new();
        decoded.insert(0x04u8, vec![30i64]);
        let readings = build_readings(&decoded, 1000);
        match &readings[0] {
            Reading::Production(p) => {
                assert_eq!(p.hourly, Some(30));
                assert_eq!(p.weekly, None);
            }
            other => panic!("unexpected reading: {:?}", other),
        }
    }

    #[tokio::test]
    async fn handle_frame_routes_all_segment_kinds() {
        // 0x01 [1,0,1] + 0x02 四个浮点 + 0x04 [30,210]
        let mut content = vec![0x01, 0x03, 0x01, 0x00, 0x01, 0x02, 0x04];
        for value in [100.5f32, -120.75, 0.0, -55.125] {
            content.extend_from_slice(&value.to_be_bytes());
        }
        content.extend_from_slice(&[0x04, 0x02, 0x00, 0x1E, 0x00, 0xD2]);

        let pdu = telemetry_pdu(&content);
        let header = header_for(pdu.len(), 1);
        let sink = Arc::new(RecordingSink::default());
        let alarms = Arc::new(RecordingAlarms::default());
        let summary = interpreter(sink.clone(), alarms.clone())
            .handle_frame(&header, &pdu)
            .await
            .expect("summary");

        assert_eq!(summary.unit_id, 1);
        assert_eq!(summary.function_code, 0x03);
        assert_eq!(summary.data_len, content.len());
        assert_eq!(summary.decoded_types, vec![0x01, 0x02, 0x04]);
        assert_eq!(summary.decoded_values[&0x01], vec![1, 0, 1]);

        let readings = sink.readings.lock().await;
        // 3 设备状态 + 4 传感器 + 1 产量
        assert_eq!(readings.len(), 8);
        match &readings[3] {
            Reading::Sensor(s) => {
                assert_eq!(s.dev_name, "涂料桶1液位");
                assert_eq!(s.value, 100.5);
            }
            other => panic!("unexpected reading: {:?}", other),
        }
        match &readings[4] {
            Reading::Sensor(s) => assert_eq!(s.value, -120.75),
            other => panic!("unexpected reading: {:?}", other),
        }
        // 无报警位：不应触发通知
        assert!(alarms.batches.lock().await.is_empty());
    }

    #[tokio::test]
    async fn handle_frame_notifies_alarm_batch_once() {
        // 5 bit，位 1/4 置 1
        let content = [0x00u8, 0x05, 0x12];
        let pdu = telemetry_pdu(&content);
        let header = header_for(pdu.len(), 7);
        let sink = Arc::new(RecordingSink::default());
        let alarms = Arc::new(RecordingAlarms::default());
        interpreter(sink, alarms.clone())
            .handle_frame(&header, &pdu)
            .await
            .expect("summary");

        let batches = alarms.batches.lock().await;
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 2);
        assert_eq!(batches[0][0].unit_id, 7);
    }

    #[tokio::test]
    async fn store_failure_does_not_abort_batch() {
        // 1 传感器（将失败）+ 2 设备状态（应继续入库）
        let mut content = vec![0x01, 0x02, 0x01, 0x00, 0x02, 0x01];
        content.extend_from_slice(&1.5f32.to_be_bytes());
        let pdu = telemetry_pdu(&content);
        let header = header_for(pdu.len(), 1);
        let sink = Arc::new(RecordingSink {
            fail_sensors: true,
            ..Default::default()
        });
        let alarms = Arc::new(RecordingAlarms::default());
        interpreter(sink.clone(), alarms)
            .handle_frame(&header, &pdu)
            .await
            .expect("summary");

        let readings = sink.readings.lock().await;
        assert_eq!(readings.len(), 2);
        assert!(readings.iter().all(|r| matches!(r, Reading::DeviceStatus(_))));
    }

    #[tokio::test]
    async fn truncated_pdu_is_length_mismatch() {
        let mut pdu = vec![0x03];
        pdu.extend_from_slice(&10u16.to_be_bytes());
        pdu.extend_from_slice(&[0xAB; 5]);
        let header = header_for(pdu.len(), 1);
        let sink = Arc::new(RecordingSink::default());
        let alarms = Arc::new(RecordingAlarms::default());
        let err = interpreter(sink, alarms)
            .handle_frame(&header, &pdu)
            .await
            .expect_err("mismatch");
        assert!(matches!(
            err,
            ProtocolError::LengthMismatch {
                declared: 10,
                actual: 5
            }
        ));
    }

    #[test]
    fn summary_serializes_with_string_keyed_values() {
        let mut decoded = BTreeMap::new();
        decoded.insert(0x01u8, vec![1i64, 0]);
        let summary = FrameSummary {
            transaction_id: 1,
            protocol_id: 0,
            mbap_length: 9,
            unit_id: 1,
            function_code: 3,
            data_len: 4,
            decoded_types: vec![0x01],
            decoded_values: decoded,
        };
        let json = serde_json::to_value(&summary).expect("serialize");
        assert_eq!(json["unitId"], 1);
        assert_eq!(json["functionCode"], 3);
        assert_eq!(json["decodedValues"]["1"][0], 1);
    }
}
