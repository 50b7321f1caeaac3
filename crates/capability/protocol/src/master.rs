//! Modbus TCP 主站轮询工具
//!
//! 与网关接入服务端并列的独立工具：作为标准 Modbus 主站周期性读取
//! 从站寄存器（如独立仪表），解析后的数值按传感器读数交给存储协作
//! 者。不参与接入服务端的数据通路。
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! let config = MasterPollConfig {
//!     host: "192.168.1.100".to_string(),
//!     port: 502,
//!     poll_interval_ms: 1000,
//! };
//! let mut poller = MasterPoller::new(config);
//! poller.add_point(point);
//! poller.run(sink).await?;
//! ```

use crate::error::ProtocolError;
use crate::interpret::ReadingSink;
use domain::{now_epoch_ms, Reading, SensorReading};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tokio_modbus::prelude::*;
use tracing::{debug, info, warn};

/// 主站轮询配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MasterPollConfig {
    /// 从站主机地址
    pub host: String,
    /// 从站端口（默认 502）
    #[serde(default = "default_master_port")]
    pub port: u16,
    /// 轮询间隔（毫秒）
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

fn default_master_port() -> u16 {
    502
}

fn default_poll_interval() -> u64 {
    1_000
}

/// 寄存器数据类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegisterDataType {
    /// 16位有符号整数
    Int16,
    /// 16位无符号整数
    Uint16,
    /// 32位浮点数（2个寄存器）
    Float32,
}

impl Default for RegisterDataType {
    fn default() -> Self {
        Self::Int16
    }
}

/// 轮询点位配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollPoint {
    /// 入库设备名
    pub dev_name: String,
    /// 从站 ID (1-247)
    pub slave_id: u8,
    /// 寄存器起始地址
    pub register_address: u16,
    /// 寄存器数量
    #[serde(default = "default_register_count")]
    pub register_count: u16,
    /// 功能码（3 保持寄存器 / 4 输入寄存器）
    #[serde(default = "default_function_code")]
    pub function_code: u8,
    /// 数据类型
    #[serde(default)]
    pub data_type: RegisterDataType,
    /// 缩放系数
    pub scale: Option<f64>,
    /// 偏移量
    pub offset: Option<f64>,
}

fn default_register_count() -> u16 {
    1
}

fn default_function_code() -> u8 {
    3
}

/// Modbus TCP 主站轮询器
pub struct MasterPoller {
    config: MasterPollConfig,
    points: Vec<PollPoint>,
}

impl MasterPoller {
    /// 创建新的主站轮询器
    pub fn new(config: MasterPollConfig) -> Self {
        Self {
            config,
            points: Vec::new(),
        }
    }

    /// 从 JSON 配置字符串解析
    pub fn from_json(json: &str) -> Result<Self, ProtocolError> {
        let config: MasterPollConfig =
            serde_json::from_str(json).map_err(|e| ProtocolError::ConfigParse(e.to_string()))?;
        Ok(Self::new(config))
    }

    /// 添加轮询点位
    pub fn add_point(&mut self, point: PollPoint) {
        self.points.push(point);
    }

    /// 运行轮询循环
    pub async fn run(&self, sink: Arc<dyn ReadingSink>) -> Result<(), ProtocolError> {
        if self.points.is_empty() {
            warn!("no poll points configured for modbus master");
            return Ok(());
        }

        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .map_err(|e| ProtocolError::ConfigParse(format!("invalid address: {}", e)))?;

        info!(
            "connecting to modbus slave at {} with {} points",
            addr,
            self.points.len()
        );

        let mut ctx = tcp::connect(addr)
            .await
            .map_err(|e| ProtocolError::Modbus(e.to_string()))?;

        info!("connected to modbus slave at {}", addr);

        let mut poll_interval = interval(Duration::from_millis(self.config.poll_interval_ms));

        loop {
            poll_interval.tick().await;

            for point in &self.points {
                match self.poll_point(&mut ctx, point).await {
                    Ok(value) => {
                        let reading = Reading::Sensor(SensorReading {
                            dev_name: point.dev_name.clone(),
                            value: value as f32,
                            ts_ms: now_epoch_ms(),
                        });
                        if let Err(e) = sink.store(reading).await {
                            warn!(
                                dev_name = %point.dev_name,
                                error = %e,
                                "failed to store polled reading"
                            );
                        }
                    }
                    Err(e) => {
                        warn!(
                            dev_name = %point.dev_name,
                            slave = point.slave_id,
                            register = point.register_address,
                            error = %e,
                            "failed to poll modbus register"
                        );
                    }
                }
            }
        }
    }

    /// 轮询单个点位
    async fn poll_point(
        &self,
        ctx: &mut tokio_modbus::client::Context,
        point: &PollPoint,
    ) -> Result<f64, ProtocolError> {
        ctx.set_slave(Slave(point.slave_id));

        let registers = match point.function_code {
            3 => {
                // 读保持寄存器
                ctx.read_holding_registers(point.register_address, point.register_count)
                    .await
                    .map_err(|e| ProtocolError::Modbus(e.to_string()))?
                    .map_err(|e| ProtocolError::Modbus(format!("exception: {:?}", e)))?
            }
            4 => {
                // 读输入寄存器
                ctx.read_input_registers(point.register_address, point.register_count)
                    .await
                    .map_err(|e| ProtocolError::Modbus(e.to_string()))?
                    .map_err(|e| ProtocolError::Modbus(format!("exception: {:?}", e)))?
            }
            _ => {
                return Err(ProtocolError::ConfigParse(format!(
                    "unsupported function code: {}",
                    point.function_code
                )));
            }
        };

        debug!(
            slave = point.slave_id,
            register = point.register_address,
            count = point.register_count,
            values = ?registers,
            "read modbus registers"
        );

        let raw_value = parse_registers(&registers, point.data_type)?;

        // 应用缩放和偏移
        let scaled_value = match (point.scale, point.offset) {
            (Some(scale), Some(offset)) => raw_value * scale + offset,
            (Some(scale), None) => raw_value * scale,
            (None, Some(offset)) => raw_value + offset,
            (None, None) => raw_value,
        };

        Ok(scaled_value)
    }
}

/// 解析寄存器数据为浮点值
fn parse_registers(registers: &[u16], data_type: RegisterDataType) -> Result<f64, ProtocolError> {
    if registers.is_empty() {
        return Err(ProtocolError::DataParse("empty registers".to_string()));
    }

    let value = match data_type {
        RegisterDataType::Int16 => registers[0] as i16 as f64,
        RegisterDataType::Uint16 => registers[0] as f64,
        RegisterDataType::Float32 => {
            if registers.len() < 2 {
                return Err(ProtocolError::DataParse(
                    "need 2 registers for float32".to_string(),
                ));
            }
            let high = registers[0] as u32;
            let low = registers[1] as u32;
            let bits = (high << 16) | low;
            f32::from_bits(bits) as f64
        }
    };

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let json = r#"{"host": "192.168.1.100", "port": 502, "poll_interval_ms": 1000}"#;
        let poller = MasterPoller::from_json(json).unwrap();
        assert_eq!(poller.config.host, "192.168.1.100");
        assert_eq!(poller.config.port, 502);
        assert_eq!(poller.config.poll_interval_ms, 1000);
    }

    #[test]
    fn test_parse_registers_int16() {
        // 正数
        let value = parse_registers(&[100u16], RegisterDataType::Int16).unwrap();
        assert_eq!(value, 100.0);

        // 负数
        let value = parse_registers(&[(-100i16) as u16], RegisterDataType::Int16).unwrap();
        assert_eq!(value, -100.0);
    }

    #[test]
    fn test_parse_registers_float32() {
        let bits = 12.5f32.to_bits();
        let registers = [(bits >> 16) as u16, bits as u16];
        let value = parse_registers(&registers, RegisterDataType::Float32).unwrap();
        assert_eq!(value, 12.5);
    }

    #[test]
    fn test_parse_poll_point() {
        let json = r#"{"dev_name": "上料管路实时压力", "slave_id": 1, "register_address": 100}"#;
        let point: PollPoint = serde_json::from_str(json).unwrap();
        assert_eq!(point.slave_id, 1);
        assert_eq!(point.register_address, 100);
        assert_eq!(point.register_count, 1);
        assert_eq!(point.function_code, 3);
        assert_eq!(point.data_type, RegisterDataType::Int16);
    }
}
