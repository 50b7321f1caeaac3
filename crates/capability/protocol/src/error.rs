//! 协议错误类型定义

/// 协议通信错误
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// 协议标识不是 0x0000，非本协议帧
    #[error("protocol id mismatch: 0x{0:04x}")]
    ProtocolMismatch(u16),

    /// MBAP 长度字段非法（length <= 1）
    #[error("invalid mbap length field: {0}")]
    InvalidLength(u16),

    /// 读取 MBAP 头失败（连接关闭或超时）
    #[error("header read failed: {0}")]
    HeaderReadFailed(String),

    /// 读取 PDU 失败（长度不足或连接关闭）
    #[error("payload read failed: {0}")]
    PayloadReadFailed(String),

    /// 声明数据长度与实际接收字节数不一致
    #[error("declared data length {declared} does not match actual {actual}")]
    LengthMismatch { declared: usize, actual: usize },

    /// 下发帧数据区超过上限
    #[error("command payload too large: {0} bytes (max 512)")]
    PayloadTooLarge(usize),

    /// 配置项数量超过单帧上限
    #[error("too many config items: {0} (max 255)")]
    TooManyItems(usize),

    /// 网关未连接，无法下发
    #[error("gateway not connected")]
    NotConnected,

    /// 首次连接等待超时
    #[error("accept timed out after {0} ms")]
    AcceptTimeout(u64),

    /// IO 错误
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Modbus 错误
    #[error("modbus error: {0}")]
    Modbus(String),

    /// 配置解析错误
    #[error("config parse error: {0}")]
    ConfigParse(String),

    /// 数据解析错误
    #[error("data parse error: {0}")]
    DataParse(String),

    /// 协作者处理错误（存储/通知）
    #[error("collaborator error: {0}")]
    Collaborator(String),
}
