//! # 网关协议能力模块
//!
//! 面向现场网络的网关侧端点，支持：
//! - **帧编解码**：MBAP 头 + PDU 的组帧/解析，确认帧、错误帧、
//!   寄存器写入帧、类型化段帧、配置下发帧（V2）
//! - **段编解码**：上行遥测段（0x00–0x04）、下行类型化段
//!   （0x07/0x08/0x09）、配置项宽度表
//! - **帧解释**：解码值映射为读数记录与报警事件，路由到协作者
//! - **接入服务端**：监听并接收唯一网关长连接的接收循环
//! - **主站轮询**：与接收通路并列的标准 Modbus 主站工具
//!
//! ## 架构设计
//!
//! ```text
//! 网关(控制器) ──TCP──▶ GatewayServer
//!       ▲                   │ 逐帧读取（MBAP 7B + PDU）
//!       │ 确认/错误/下发帧   ▼
//!   GatewayLink ◀──── frame / segment 编解码
//!                           │
//!                           ▼
//!                   FrameInterpreter
//!                     │        │        │
//!                     ▼        ▼        ▼
//!               ReadingSink AlarmSink QualityProbe
//!               （存储）    （通知）  （外部评分）
//! ```
//!
//! 编号空间约定：上行遥测段 0x00–0x06 与下行类型化段 0x07–0x09
//! 是两套独立编号，前者表示业务类别，后者表示原始线上类型。

mod error;
pub mod frame;
mod interpret;
mod master;
pub mod segment;
mod server;

pub use error::ProtocolError;
pub use frame::{MbapHeader, OutboundCommand, ACK_FILL, FIXED_TX_ID, MAX_COMMAND_DATA_LEN, MBAP_LEN};
pub use interpret::{
    build_readings, derive_alarm_events, AlarmSink, FrameInterpreter, FrameSummary,
    NoopQualityProbe, QualityProbe, ReadingSink,
};
pub use master::{MasterPollConfig, MasterPoller, PollPoint, RegisterDataType};
pub use segment::{CommandSegment, ConfigItem, ConfigValue};
pub use server::{GatewayLink, GatewayServer, GatewayServerConfig};
