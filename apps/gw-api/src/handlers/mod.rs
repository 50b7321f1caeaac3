//! API handlers 模块
//!
//! 按资源拆分：
//! - `alarms`：SSE 报警流与报警测试
//! - `commands`：运维下发（类型化段 / 配置 V2 / 寄存器写入）
//! - `gateway`：健康检查、连接状态、最近帧摘要
//! - `metrics`：网关指标快照
//! - `readings`：各记录族最新值查询

pub mod alarms;
pub mod commands;
pub mod gateway;
pub mod metrics;
pub mod readings;

pub use alarms::*;
pub use commands::*;
pub use gateway::*;
pub use metrics::*;
pub use readings::*;
