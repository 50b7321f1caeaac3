//! 数据段编解码
//!
//! 线上数据区由三种相互独立的子格式构成：
//! - 上行遥测段：`[类型标识 1B][数量 1B][数据 ...]`，类型 0x00–0x04；
//! - 下行类型化段：类型 0x07/0x08/0x09（bool/int16/real32），编号与
//!   遥测段各自独立，表示原始线上类型而非业务类别；
//! - 下行配置项（V2）：`[dataId 1B][值]`，值宽度由 dataId 决定，线上
//!   无类型标识。
//!
//! 所有多字节整数大端，bool 按位打包低位优先。本模块只做纯编解码，
//! 无 IO、无状态。

use crate::error::ProtocolError;
use std::collections::BTreeMap;

/// 上行遥测段类型标识。
pub mod telemetry_type {
    /// 报警信息（按位，低位优先）
    pub const ALARM: u8 = 0x00;
    /// 设备状态信息（1 字节，非零为激活）
    pub const DEVICE_STATUS: u8 = 0x01;
    /// 传感器参数（REAL32 大端）
    pub const SENSOR: u8 = 0x02;
    /// 喷涂记录（16 位大端）
    pub const SPRAY: u8 = 0x03;
    /// 喷涂产量（16 位大端：0=当日每时，1=当月每周）
    pub const PRODUCTION: u8 = 0x04;
    /// 控制参数（协议预留，未实现）
    pub const CONTROL_RESERVED: u8 = 0x05;
    /// 运动参数（协议预留，未实现）
    pub const MOTION_RESERVED: u8 = 0x06;
}

/// 下行类型化段类型标识（与遥测段编号空间独立）。
pub mod command_type {
    pub const BOOL: u8 = 0x07;
    pub const INT16: u8 = 0x08;
    pub const REAL32: u8 = 0x09;
}

/// 扫描遥测数据区，按类型标识聚合原始值。
///
/// 返回 `类型标识 -> 原始值列表`：
/// - 0x00 每 bit 一个 0/1；
/// - 0x01 每字节一个值；
/// - 0x02 保存 REAL32 的原始位模式（由调用方 `f32::from_bits` 还原）；
/// - 0x03/0x04 每 16 位一个值。
///
/// 遇到预留/未知类型停止扫描，剩余字节按不存在处理；段声明长度越过
/// 数据区末尾时同样提前停止，已解析的段保留在结果中。
pub fn decode_segments(data: &[u8]) -> BTreeMap<u8, Vec<i64>> {
    let end = data.len();
    let mut out: BTreeMap<u8, Vec<i64>> = BTreeMap::new();
    let mut offset = 0usize;

    while offset < end {
        if offset + 2 > end {
            break; // 不足 [typeId][count]
        }
        let type_id = data[offset];
        let count = data[offset + 1] as usize;
        offset += 2;

        match type_id {
            telemetry_type::ALARM => {
                let values = out.entry(type_id).or_default();
                let bit_bytes = (count + 7) / 8;
                if offset + bit_bytes > end {
                    offset = end;
                    continue;
                }
                for i in 0..count {
                    let bit = (data[offset + i / 8] >> (i % 8)) & 0x01;
                    values.push(bit as i64);
                }
                offset += bit_bytes;
            }
            telemetry_type::DEVICE_STATUS => {
                let values = out.entry(type_id).or_default();
                if offset + count > end {
                    offset = end;
                    continue;
                }
                for i in 0..count {
                    values.push(data[offset + i] as i64);
                }
                offset += count;
            }
            telemetry_type::SENSOR => {
                let values = out.entry(type_id).or_default();
                let need = count * 4;
                if offset + need > end {
                    offset = end;
                    continue;
                }
                for _ in 0..count {
                    let bits = u32::from_be_bytes([
                        data[offset],
                        data[offset + 1],
                        data[offset + 2],
                        data[offset + 3],
                    ]);
                    values.push(bits as i64);
                    offset += 4;
                }
            }
            telemetry_type::SPRAY | telemetry_type::PRODUCTION => {
                let values = out.entry(type_id).or_default();
                let need = count * 2;
                if offset + need > end {
                    offset = end;
                    continue;
                }
                for _ in 0..count {
                    let value = u16::from_be_bytes([data[offset], data[offset + 1]]);
                    values.push(value as i64);
                    offset += 2;
                }
            }
            // 预留/未知类型：停止扫描，剩余字节按不存在处理
            _ => break,
        }
    }

    out
}

/// bool 列表按位打包（低位优先），共 `ceil(len/8)` 字节。
pub fn pack_bools(values: &[bool]) -> Vec<u8> {
    let mut bytes = vec![0u8; (values.len() + 7) / 8];
    for (i, value) in values.iter().enumerate() {
        if *value {
            bytes[i / 8] |= 1 << (i % 8);
        }
    }
    bytes
}

/// 按位解包 `count` 个 bool（低位优先），与 [`pack_bools`] 对称。
pub fn unpack_bools(bytes: &[u8], count: usize) -> Vec<bool> {
    (0..count)
        .map(|i| {
            bytes
                .get(i / 8)
                .map(|byte| (byte >> (i % 8)) & 0x01 == 0x01)
                .unwrap_or(false)
        })
        .collect()
}

/// int16 列表编码为大端字节流。
pub fn encode_int16(values: &[i16]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(values.len() * 2);
    for value in values {
        bytes.extend_from_slice(&value.to_be_bytes());
    }
    bytes
}

/// 大端字节流解码为 int16 列表，与 [`encode_int16`] 对称。
pub fn decode_int16(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|chunk| i16::from_be_bytes([chunk[0], chunk[1]]))
        .collect()
}

/// real32 列表编码为大端 IEEE-754 字节流（f64 收窄为单精度）。
pub fn encode_real32(values: &[f64]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(values.len() * 4);
    for value in values {
        bytes.extend_from_slice(&(*value as f32).to_be_bytes());
    }
    bytes
}

/// 大端字节流解码为 f32 列表，与 [`encode_real32`] 对称。
pub fn decode_real32(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// 下行类型化段：`[typeId][count][payload]`。
#[derive(Debug, Clone, PartialEq)]
pub struct CommandSegment {
    pub type_id: u8,
    pub count: u8,
    pub payload: Vec<u8>,
}

impl CommandSegment {
    /// bool 段（0x07）：count 为逻辑 bool 个数。
    pub fn of_bools(values: &[bool]) -> Result<Self, ProtocolError> {
        let count = checked_count(values.len())?;
        Ok(Self {
            type_id: command_type::BOOL,
            count,
            payload: pack_bools(values),
        })
    }

    /// int16 段（0x08）：每值 2 字节大端。
    pub fn of_int16(values: &[i16]) -> Result<Self, ProtocolError> {
        let count = checked_count(values.len())?;
        Ok(Self {
            type_id: command_type::INT16,
            count,
            payload: encode_int16(values),
        })
    }

    /// real32 段（0x09）：每值 4 字节大端，f64 收窄为单精度。
    pub fn of_real32(values: &[f64]) -> Result<Self, ProtocolError> {
        let count = checked_count(values.len())?;
        Ok(Self {
            type_id: command_type::REAL32,
            count,
            payload: encode_real32(values),
        })
    }

    /// 段编码后的字节数（含类型标识与数量）。
    pub fn encoded_len(&self) -> usize {
        2 + self.payload.len()
    }

    /// 追加编码到帧缓冲。
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        out.push(self.type_id);
        out.push(self.count);
        out.extend_from_slice(&self.payload);
    }
}

fn checked_count(len: usize) -> Result<u8, ProtocolError> {
    u8::try_from(len)
        .map_err(|_| ProtocolError::DataParse(format!("segment value count {} exceeds 255", len)))
}

/// 配置项取值（V2 下发）。
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    /// 字符代号，1 字节（dataId 0x01–0x05）
    CharCode(u8),
    /// 16 位整数，大端（dataId 0x06）
    Int16(i16),
    /// 32 位浮点，大端（dataId 0x07–0x13）
    Real32(f64),
}

/// 下行配置项（V2）：`[dataId][值]`，宽度由 dataId 查表。
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigItem {
    pub data_id: u8,
    pub value: ConfigValue,
}

/// dataId 对应的值宽度（字节）；超出 0x01–0x13 返回 None。
pub fn config_value_width(data_id: u8) -> Option<usize> {
    match data_id {
        0x01..=0x05 => Some(1),
        0x06 => Some(2),
        0x07..=0x13 => Some(4),
        _ => None,
    }
}

impl ConfigItem {
    /// 构造配置项并校验 dataId 与取值宽度匹配。
    pub fn new(data_id: u8, value: ConfigValue) -> Result<Self, ProtocolError> {
        let width = config_value_width(data_id).ok_or_else(|| {
            ProtocolError::DataParse(format!("config data id 0x{:02x} out of range", data_id))
        })?;
        let actual = match &value {
            ConfigValue::CharCode(_) => 1,
            ConfigValue::Int16(_) => 2,
            ConfigValue::Real32(_) => 4,
        };
        if width != actual {
            return Err(ProtocolError::DataParse(format!(
                "config data id 0x{:02x} expects {} byte value, got {}",
                data_id, width, actual
            )));
        }
        Ok(Self { data_id, value })
    }

    /// 项编码后的字节数（含 dataId）。
    pub fn encoded_len(&self) -> usize {
        1 + match &self.value {
            ConfigValue::CharCode(_) => 1,
            ConfigValue::Int16(_) => 2,
            ConfigValue::Real32(_) => 4,
        }
    }

    /// 追加编码到帧缓冲。
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        out.push(self.data_id);
        match &self.value {
            ConfigValue::CharCode(code) => out.push(*code),
            ConfigValue::Int16(value) => out.extend_from_slice(&value.to_be_bytes()),
            ConfigValue::Real32(value) => out.extend_from_slice(&(*value as f32).to_be_bytes()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_pack_low_bit_first() {
        // [true,false,true,true,false] => 0b00001101 = 0x0D
        let packed = pack_bools(&[true, false, true, true, false]);
        assert_eq!(packed, vec![0x0D]);
    }

    #[test]
    fn bool_pack_crosses_byte_boundary() {
        // 10 位：索引 0,2,3,7,8 置 1 => byte0=0x8D, byte1=0x01
        let values = [
            true, false, true, true, false, false, false, true, true, false,
        ];
        let packed = pack_bools(&values);
        assert_eq!(packed, vec![0x8D, 0x01]);
        assert_eq!(unpack_bools(&packed, values.len()), values);
    }

    #[test]
    fn int16_round_trip() {
        let values = [1i16, 2, -3, i16::MAX, i16::MIN];
        assert_eq!(decode_int16(&encode_int16(&values)), values);
        assert_eq!(encode_int16(&[1, 2]), vec![0x00, 0x01, 0x00, 0x02]);
    }

    #[test]
    fn real32_round_trip() {
        let values = [123.45f64, -67.5, 0.0];
        let decoded = decode_real32(&encode_real32(&values));
        assert_eq!(decoded, vec![123.45f32, -67.5, 0.0]);
    }

    #[test]
    fn typed_segment_constructors() {
        let seg = CommandSegment::of_bools(&[true, false, true, true, false]).expect("bool seg");
        assert_eq!(seg.type_id, command_type::BOOL);
        assert_eq!(seg.count, 5);
        assert_eq!(seg.payload, vec![0x0D]);

        let seg = CommandSegment::of_int16(&[1, 2]).expect("int16 seg");
        assert_eq!(seg.type_id, command_type::INT16);
        assert_eq!(seg.payload, vec![0x00, 0x01, 0x00, 0x02]);

        let seg = CommandSegment::of_real32(&[123.45, -67.5]).expect("real32 seg");
        assert_eq!(seg.type_id, command_type::REAL32);
        assert_eq!(seg.count, 2);
        let bits = u32::from_be_bytes([seg.payload[0], seg.payload[1], seg.payload[2], seg.payload[3]]);
        assert_eq!(bits, 123.45f32.to_bits());
    }

    #[test]
    fn typed_segment_rejects_oversized_count() {
        let values = vec![0i16; 256];
        assert!(CommandSegment::of_int16(&values).is_err());
    }

    #[test]
    fn decode_mixed_segments() {
        // 0x01 设备状态 [1,0,1] + 0x04 产量 [30,210]
        let data = [
            0x01, 0x03, 0x01, 0x00, 0x01, //
            0x04, 0x02, 0x00, 0x1E, 0x00, 0xD2,
        ];
        let decoded = decode_segments(&data);
        assert_eq!(decoded[&0x01], vec![1, 0, 1]);
        assert_eq!(decoded[&0x04], vec![30, 210]);
    }

    #[test]
    fn decode_sensor_keeps_raw_bit_pattern() {
        let mut data = vec![0x02, 0x04];
        for value in [100.5f32, -120.75, 0.0, -55.125] {
            data.extend_from_slice(&value.to_be_bytes());
        }
        let decoded = decode_segments(&data);
        let sensors = &decoded[&0x02];
        assert_eq!(sensors.len(), 4);
        let restored: Vec<f32> = sensors.iter().map(|bits| f32::from_bits(*bits as u32)).collect();
        assert_eq!(restored, vec![100.5, -120.75, 0.0, -55.125]);
    }

    #[test]
    fn decode_alarm_bits_low_bit_first() {
        // 5 bit，位 1 和位 4 置 1 => 0b00010010 = 0x12
        let data = [0x00, 0x05, 0x12];
        let decoded = decode_segments(&data);
        assert_eq!(decoded[&0x00], vec![0, 1, 0, 0, 1]);
    }

    #[test]
    fn unknown_type_halts_scan_keeping_prior_segments() {
        let data = [
            0x01, 0x02, 0x01, 0x00, // 已解析段
            0x05, 0x04, 0xDE, 0xAD, 0xBE, 0xEF, // 预留类型：停止
            0x04, 0x01, 0x00, 0x1E, // 不应再被解析
        ];
        let decoded = decode_segments(&data);
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[&0x01], vec![1, 0]);
    }

    #[test]
    fn overrunning_segment_stops_early() {
        // 声明 4 个传感器值但只有 2 字节数据
        let data = [0x02, 0x04, 0x00, 0x01];
        let decoded = decode_segments(&data);
        assert!(decoded[&0x02].is_empty());
    }

    #[test]
    fn config_item_width_table() {
        assert_eq!(config_value_width(0x01), Some(1));
        assert_eq!(config_value_width(0x06), Some(2));
        assert_eq!(config_value_width(0x07), Some(4));
        assert_eq!(config_value_width(0x13), Some(4));
        assert_eq!(config_value_width(0x14), None);
        assert_eq!(config_value_width(0x00), None);
    }

    #[test]
    fn config_item_rejects_width_mismatch() {
        assert!(ConfigItem::new(0x01, ConfigValue::Int16(1)).is_err());
        assert!(ConfigItem::new(0x06, ConfigValue::Real32(1.0)).is_err());
        assert!(ConfigItem::new(0x14, ConfigValue::CharCode(b'A')).is_err());
    }

    #[test]
    fn config_item_encodes_by_data_id() {
        let mut out = Vec::new();
        ConfigItem::new(0x01, ConfigValue::CharCode(b'A'))
            .expect("char item")
            .encode_into(&mut out);
        ConfigItem::new(0x06, ConfigValue::Int16(-2))
            .expect("int item")
            .encode_into(&mut out);
        ConfigItem::new(0x07, ConfigValue::Real32(1.5))
            .expect("real item")
            .encode_into(&mut out);
        let mut expected = vec![0x01, b'A', 0x06, 0xFF, 0xFE, 0x07];
        expected.extend_from_slice(&1.5f32.to_be_bytes());
        assert_eq!(out, expected);
    }
}
