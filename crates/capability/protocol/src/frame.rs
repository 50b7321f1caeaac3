//! MBAP 帧编解码
//!
//! 帧 = MBAP 头（7 字节）+ PDU：
//!
//! ```text
//! [事务ID 2B][协议ID 2B=0x0000][长度 2B][单元标识符 1B] [PDU ...]
//! ```
//!
//! 长度字段约定：`length = 单元标识符(1) + PDU 字节数`，读取方按
//! `pdu_len = length - 1` 还原。所有应答与下发帧统一遵守该约定。
//!
//! 上行遥测 PDU：`[功能码 1B][数据位长度 2B][数据内容 ...]`；对长度
//! 一致的帧回确认帧（数据区全 0xAA），不一致回错误帧（定值 0xFFFF，
//! 含义 -1），连接保持。

use crate::error::ProtocolError;
use crate::segment::{CommandSegment, ConfigItem};

/// MBAP 头字节数。
pub const MBAP_LEN: usize = 7;

/// 确认帧数据区填充值。
pub const ACK_FILL: u8 = 0xAA;

/// 下发帧数据区字节数上限。
pub const MAX_COMMAND_DATA_LEN: usize = 512;

/// 下发帧使用的固定事务 ID。
pub const FIXED_TX_ID: u16 = 0x0001;

/// 长度不一致错误帧的 PDU：`[功能码][00][02][FF][FF]`（定值 -1）。
const ERROR_SENTINEL: [u8; 4] = [0x00, 0x02, 0xFF, 0xFF];

/// MBAP 头。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MbapHeader {
    pub transaction_id: u16,
    pub protocol_id: u16,
    pub length: u16,
    pub unit_id: u8,
}

impl MbapHeader {
    /// 解码 7 字节 MBAP 头，校验协议标识为 0x0000。
    pub fn decode(bytes: &[u8; MBAP_LEN]) -> Result<Self, ProtocolError> {
        let header = Self {
            transaction_id: u16::from_be_bytes([bytes[0], bytes[1]]),
            protocol_id: u16::from_be_bytes([bytes[2], bytes[3]]),
            length: u16::from_be_bytes([bytes[4], bytes[5]]),
            unit_id: bytes[6],
        };
        if header.protocol_id != 0x0000 {
            return Err(ProtocolError::ProtocolMismatch(header.protocol_id));
        }
        Ok(header)
    }

    /// 编码为 7 字节。
    pub fn encode(&self) -> [u8; MBAP_LEN] {
        let mut bytes = [0u8; MBAP_LEN];
        bytes[0..2].copy_from_slice(&self.transaction_id.to_be_bytes());
        bytes[2..4].copy_from_slice(&self.protocol_id.to_be_bytes());
        bytes[4..6].copy_from_slice(&self.length.to_be_bytes());
        bytes[6] = self.unit_id;
        bytes
    }

    /// 按长度字段推导 PDU 字节数（`length - 1`）。
    pub fn pdu_len(&self) -> Result<usize, ProtocolError> {
        if self.length <= 1 {
            return Err(ProtocolError::InvalidLength(self.length));
        }
        Ok(self.length as usize - 1)
    }
}

/// 拼装完整帧：重算长度字段（`pdu_len + 1`），沿用事务/协议/单元标识。
fn assemble_frame(transaction_id: u16, unit_id: u8, pdu: &[u8]) -> Vec<u8> {
    let header = MbapHeader {
        transaction_id,
        protocol_id: 0x0000,
        length: (pdu.len() + 1) as u16,
        unit_id,
    };
    let mut frame = Vec::with_capacity(MBAP_LEN + pdu.len());
    frame.extend_from_slice(&header.encode());
    frame.extend_from_slice(pdu);
    frame
}

/// 构造确认帧：PDU 形状与来帧声明一致（功能码 + 数据位长度原样），
/// 数据内容全部替换为 0xAA。
pub fn build_ack_frame(header: &MbapHeader, pdu: &[u8]) -> Result<Vec<u8>, ProtocolError> {
    if pdu.len() < 3 {
        return Err(ProtocolError::DataParse(
            "pdu shorter than function code + data length".to_string(),
        ));
    }
    let declared = u16::from_be_bytes([pdu[1], pdu[2]]) as usize;
    let mut resp_pdu = Vec::with_capacity(3 + declared);
    resp_pdu.push(pdu[0]);
    resp_pdu.push(pdu[1]);
    resp_pdu.push(pdu[2]);
    resp_pdu.resize(3 + declared, ACK_FILL);
    Ok(assemble_frame(header.transaction_id, header.unit_id, &resp_pdu))
}

/// 构造错误帧：声明长度与实际不一致时应答，数据区为定值 0xFFFF（-1）。
pub fn build_error_frame(header: &MbapHeader, function_code: u8) -> Vec<u8> {
    let mut resp_pdu = Vec::with_capacity(1 + ERROR_SENTINEL.len());
    resp_pdu.push(function_code);
    resp_pdu.extend_from_slice(&ERROR_SENTINEL);
    assemble_frame(header.transaction_id, header.unit_id, &resp_pdu)
}

/// 校验来帧声明长度并构造应答。
///
/// 返回 `(数据位长度, 应答帧)`；长度一致返回声明长度与确认帧，
/// 不一致返回 `-1` 与错误帧。这是判定「收到的帧是否与自身长度字段
/// 一致」的唯一位置。
pub fn validate_and_respond(
    header: &MbapHeader,
    pdu: &[u8],
) -> Result<(i32, Vec<u8>), ProtocolError> {
    if pdu.len() < 3 {
        return Err(ProtocolError::DataParse(
            "pdu shorter than function code + data length".to_string(),
        ));
    }
    let declared = u16::from_be_bytes([pdu[1], pdu[2]]) as usize;
    if 1 + 2 + declared != pdu.len() {
        Ok((-1, build_error_frame(header, pdu[0])))
    } else {
        Ok((declared as i32, build_ack_frame(header, pdu)?))
    }
}

/// 下行帧（出站编码空间与上行遥测 0x00–0x06 编号彼此独立）。
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundCommand {
    /// 写单个保持寄存器（功能码 0x06）
    WriteSingleRegister { address: u16, value: u16 },
    /// 写多个保持寄存器（功能码 0x10）
    WriteMultipleRegisters { start_address: u16, values: Vec<u16> },
    /// 类型化段组帧（0x07/0x08/0x09 段）
    TypedSegments {
        function_code: u8,
        start_address: u16,
        segments: Vec<CommandSegment>,
    },
    /// 参数配置下发 V2（无类型标识，宽度查表）
    ConfigV2 {
        function_code: u8,
        items: Vec<ConfigItem>,
    },
}

impl OutboundCommand {
    /// 编码为完整帧（MBAP + PDU）。容量校验在写出任何字节之前完成。
    pub fn encode(&self, transaction_id: u16, unit_id: u8) -> Result<Vec<u8>, ProtocolError> {
        let pdu = match self {
            OutboundCommand::WriteSingleRegister { address, value } => {
                let mut pdu = Vec::with_capacity(5);
                pdu.push(0x06);
                pdu.extend_from_slice(&address.to_be_bytes());
                pdu.extend_from_slice(&value.to_be_bytes());
                pdu
            }
            OutboundCommand::WriteMultipleRegisters {
                start_address,
                values,
            } => {
                let quantity = values.len() as u16;
                let byte_count = (values.len() * 2) as u8;
                let mut pdu = Vec::with_capacity(6 + values.len() * 2);
                pdu.push(0x10);
                pdu.extend_from_slice(&start_address.to_be_bytes());
                pdu.extend_from_slice(&quantity.to_be_bytes());
                pdu.push(byte_count);
                for value in values {
                    pdu.extend_from_slice(&value.to_be_bytes());
                }
                pdu
            }
            OutboundCommand::TypedSegments {
                function_code,
                start_address,
                segments,
            } => {
                let data_len: usize = segments.iter().map(CommandSegment::encoded_len).sum();
                if data_len > MAX_COMMAND_DATA_LEN {
                    return Err(ProtocolError::PayloadTooLarge(data_len));
                }
                let mut pdu = Vec::with_capacity(5 + data_len);
                pdu.push(*function_code);
                pdu.extend_from_slice(&start_address.to_be_bytes());
                pdu.extend_from_slice(&(data_len as u16).to_be_bytes());
                for segment in segments {
                    segment.encode_into(&mut pdu);
                }
                pdu
            }
            OutboundCommand::ConfigV2 {
                function_code,
                items,
            } => {
                if items.len() > 255 {
                    return Err(ProtocolError::TooManyItems(items.len()));
                }
                let data_len: usize = items.iter().map(ConfigItem::encoded_len).sum();
                let mut pdu = Vec::with_capacity(2 + data_len);
                pdu.push(*function_code);
                pdu.push(items.len() as u8);
                for item in items {
                    item.encode_into(&mut pdu);
                }
                pdu
            }
        };
        Ok(assemble_frame(transaction_id, unit_id, &pdu))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::ConfigValue;

    fn telemetry_pdu(function_code: u8, declared: usize, actual: usize) -> Vec<u8> {
        let mut pdu = Vec::with_capacity(3 + actual);
        pdu.push(function_code);
        pdu.extend_from_slice(&(declared as u16).to_be_bytes());
        pdu.extend((0..actual).map(|i| i as u8));
        pdu
    }

    fn sample_header() -> MbapHeader {
        MbapHeader {
            transaction_id: 0x1234,
            protocol_id: 0x0000,
            length: 0,
            unit_id: 0x01,
        }
    }

    #[test]
    fn decode_header_extracts_fields() {
        let bytes = [0x00, 0x01, 0x00, 0x00, 0x00, 0x10, 0x02];
        let header = MbapHeader::decode(&bytes).expect("header");
        assert_eq!(header.transaction_id, 1);
        assert_eq!(header.protocol_id, 0);
        assert_eq!(header.length, 16);
        assert_eq!(header.unit_id, 2);
        assert_eq!(header.pdu_len().expect("pdu len"), 15);
        assert_eq!(header.encode(), bytes);
    }

    #[test]
    fn decode_header_rejects_protocol_mismatch() {
        let bytes = [0x00, 0x01, 0x00, 0x01, 0x00, 0x10, 0x02];
        let err = MbapHeader::decode(&bytes).expect_err("mismatch");
        assert!(matches!(err, ProtocolError::ProtocolMismatch(0x0001)));
    }

    #[test]
    fn pdu_len_rejects_short_length_field() {
        let mut header = sample_header();
        header.length = 1;
        assert!(matches!(
            header.pdu_len(),
            Err(ProtocolError::InvalidLength(1))
        ));
    }

    #[test]
    fn ack_frame_fills_data_with_aa() {
        let header = sample_header();
        let pdu = telemetry_pdu(0x03, 10, 10);
        let (ret, frame) = validate_and_respond(&header, &pdu).expect("respond");
        assert_eq!(ret, 10);

        // MBAP 沿用事务/协议/单元标识，长度 = PDU + 1
        assert_eq!(&frame[0..2], &[0x12, 0x34]);
        assert_eq!(&frame[2..4], &[0x00, 0x00]);
        let mbap_len = u16::from_be_bytes([frame[4], frame[5]]) as usize;
        assert_eq!(frame[6], 0x01);
        let resp_pdu = &frame[7..];
        assert_eq!(mbap_len, resp_pdu.len() + 1);

        // PDU：功能码 + 原样数据位长度 + 全 0xAA
        assert_eq!(resp_pdu[0], 0x03);
        assert_eq!(u16::from_be_bytes([resp_pdu[1], resp_pdu[2]]), 10);
        assert_eq!(resp_pdu.len(), 3 + 10);
        assert!(resp_pdu[3..].iter().all(|byte| *byte == ACK_FILL));
    }

    #[test]
    fn length_mismatch_yields_error_frame() {
        let header = sample_header();
        // 声明 10 字节数据，实际只有 5 字节
        let pdu = telemetry_pdu(0x03, 10, 5);
        let (ret, frame) = validate_and_respond(&header, &pdu).expect("respond");
        assert_eq!(ret, -1);

        let mbap_len = u16::from_be_bytes([frame[4], frame[5]]) as usize;
        let resp_pdu = &frame[7..];
        assert_eq!(resp_pdu, &[0x03, 0x00, 0x02, 0xFF, 0xFF]);
        assert_eq!(mbap_len, 6); // UnitId(1) + PDU(5)
        assert_eq!(frame.len(), 12);
    }

    #[test]
    fn write_single_register_frame() {
        let frame = OutboundCommand::WriteSingleRegister {
            address: 0x0010,
            value: 0x1234,
        }
        .encode(FIXED_TX_ID, 1)
        .expect("frame");
        assert_eq!(&frame[7..], &[0x06, 0x00, 0x10, 0x12, 0x34]);
        let mbap_len = u16::from_be_bytes([frame[4], frame[5]]) as usize;
        assert_eq!(mbap_len, frame.len() - 7 + 1);
    }

    #[test]
    fn write_multiple_registers_frame() {
        let frame = OutboundCommand::WriteMultipleRegisters {
            start_address: 0x0002,
            values: vec![0x000A, 0x0102],
        }
        .encode(FIXED_TX_ID, 1)
        .expect("frame");
        assert_eq!(
            &frame[7..],
            &[0x10, 0x00, 0x02, 0x00, 0x02, 0x04, 0x00, 0x0A, 0x01, 0x02]
        );
    }

    #[test]
    fn typed_command_frame_layout() {
        let segments = vec![
            CommandSegment::of_bools(&[true, false, true, true, false]).expect("bools"),
            CommandSegment::of_int16(&[1, 2]).expect("int16"),
            CommandSegment::of_real32(&[123.45, -67.5]).expect("real32"),
        ];
        let frame = OutboundCommand::TypedSegments {
            function_code: 0x10,
            start_address: 0x0000,
            segments,
        }
        .encode(0x1234, 1)
        .expect("frame");

        let mbap_len = u16::from_be_bytes([frame[4], frame[5]]) as usize;
        assert_eq!(frame[6], 1);
        let pdu = &frame[7..];
        assert_eq!(mbap_len, pdu.len() + 1);

        assert_eq!(pdu[0], 0x10);
        assert_eq!(&pdu[1..3], &[0x00, 0x00]);
        let data_len = u16::from_be_bytes([pdu[3], pdu[4]]) as usize;
        assert_eq!(data_len, pdu.len() - 5);

        // 段1：bool(0x07) 5 个 => 1 字节 0x0D
        let mut p = 5;
        assert_eq!(pdu[p], 0x07);
        assert_eq!(pdu[p + 1], 5);
        assert_eq!(pdu[p + 2], 0x0D);
        p += 3;
        // 段2：int16(0x08)
        assert_eq!(pdu[p], 0x08);
        assert_eq!(pdu[p + 1], 2);
        assert_eq!(&pdu[p + 2..p + 6], &[0x00, 0x01, 0x00, 0x02]);
        p += 6;
        // 段3：real32(0x09)
        assert_eq!(pdu[p], 0x09);
        assert_eq!(pdu[p + 1], 2);
        let bits = u32::from_be_bytes([pdu[p + 2], pdu[p + 3], pdu[p + 4], pdu[p + 5]]);
        assert_eq!(bits, 123.45f32.to_bits());
    }

    #[test]
    fn typed_command_frame_rejects_oversized_data() {
        // 129 个 int16 段 × 4 字节 = 516 > 512
        let segments: Vec<CommandSegment> = (0..129)
            .map(|_| CommandSegment::of_int16(&[0]).expect("segment"))
            .collect();
        let err = OutboundCommand::TypedSegments {
            function_code: 0x10,
            start_address: 0,
            segments,
        }
        .encode(FIXED_TX_ID, 1)
        .expect_err("too large");
        assert!(matches!(err, ProtocolError::PayloadTooLarge(516)));
    }

    #[test]
    fn config_v2_frame_layout() {
        let items = vec![
            ConfigItem::new(0x02, ConfigValue::CharCode(b'B')).expect("char"),
            ConfigItem::new(0x06, ConfigValue::Int16(300)).expect("int"),
            ConfigItem::new(0x10, ConfigValue::Real32(-2.25)).expect("real"),
        ];
        let frame = OutboundCommand::ConfigV2 {
            function_code: 0x10,
            items,
        }
        .encode(FIXED_TX_ID, 3)
        .expect("frame");

        let pdu = &frame[7..];
        assert_eq!(pdu[0], 0x10);
        assert_eq!(pdu[1], 3); // item count
        let mut expected = vec![0x02, b'B', 0x06, 0x01, 0x2C, 0x10];
        expected.extend_from_slice(&(-2.25f32).to_be_bytes());
        assert_eq!(&pdu[2..], expected.as_slice());
        let mbap_len = u16::from_be_bytes([frame[4], frame[5]]) as usize;
        assert_eq!(mbap_len, pdu.len() + 1);
    }

    #[test]
    fn config_v2_rejects_too_many_items() {
        let items: Vec<ConfigItem> = (0..256)
            .map(|_| ConfigItem::new(0x01, ConfigValue::CharCode(0)).expect("item"))
            .collect();
        let err = OutboundCommand::ConfigV2 {
            function_code: 0x10,
            items,
        }
        .encode(FIXED_TX_ID, 1)
        .expect_err("too many");
        assert!(matches!(err, ProtocolError::TooManyItems(256)));
    }
}
