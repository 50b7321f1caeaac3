//! 应用运行配置加载。

use std::env;

/// 配置加载错误。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env: {0}")]
    Missing(String),
    #[error("invalid value for {0}: {1}")]
    Invalid(String, String),
}

/// 应用运行配置。
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// 管理 API 监听地址
    pub http_addr: String,
    /// 读数库连接串；缺省时退化为内存存储（本地联调）
    pub database_url: Option<String>,
    /// 网关接入监听端口
    pub gateway_listen_port: u16,
    /// 首次连接等待超时（毫秒）
    pub gateway_initial_timeout_ms: u64,
    /// 连接断开后的重连退避（毫秒）
    pub gateway_reconnect_backoff_ms: u64,
    /// 是否启用主站轮询工具
    pub master_enabled: bool,
    /// 主站轮询目标主机
    pub master_host: String,
    /// 主站轮询目标端口
    pub master_port: u16,
    /// 主站轮询间隔（毫秒）
    pub master_poll_interval_ms: u64,
}

impl AppConfig {
    /// 从环境变量读取配置。
    pub fn from_env() -> Result<Self, ConfigError> {
        let http_addr = env::var("GW_HTTP_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
        let database_url = read_optional("GW_DATABASE_URL");
        let gateway_listen_port = read_u16_with_default("GW_GATEWAY_LISTEN_PORT", 8087)?;
        let gateway_initial_timeout_ms =
            read_u64_with_default("GW_GATEWAY_INITIAL_TIMEOUT_MS", 30_000)?;
        let gateway_reconnect_backoff_ms =
            read_u64_with_default("GW_GATEWAY_RECONNECT_BACKOFF_MS", 1_000)?;
        let master_enabled = read_bool_with_default("GW_MASTER", false);
        let master_host = env::var("GW_MASTER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let master_port = read_u16_with_default("GW_MASTER_PORT", 502)?;
        let master_poll_interval_ms = read_u64_with_default("GW_MASTER_POLL_INTERVAL_MS", 1_000)?;

        Ok(Self {
            http_addr,
            database_url,
            gateway_listen_port,
            gateway_initial_timeout_ms,
            gateway_reconnect_backoff_ms,
            master_enabled,
            master_host,
            master_port,
            master_poll_interval_ms,
        })
    }
}

fn read_u16_with_default(key: &str, default: u16) -> Result<u16, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u16>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_u64_with_default(key: &str, default: u64) -> Result<u64, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u64>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_optional(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) if !value.is_empty() => Some(value),
        _ => None,
    }
}

fn read_bool_with_default(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(value) => matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "on"),
        Err(_) => default,
    }
}
