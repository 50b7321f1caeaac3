//! 网关接入服务端
//!
//! 监听 TCP 端口，接收唯一一台网关（控制器侧）的长连接，循环读取
//! MBAP 帧并交给帧解释器；同一连接同时承载确认/错误应答与运维下发
//! 帧。连接断开后退避重连，进程退出通过关停信号解除阻塞中的
//! accept/read。
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! let config = GatewayServerConfig {
//!     listen_port: 8087,
//!     ..Default::default()
//! };
//! let server = GatewayServer::new(config, interpreter);
//! let link = server.link();
//! tokio::spawn(async move { server.run().await });
//! link.send_command(1, &command).await?;
//! ```

use crate::error::ProtocolError;
use crate::frame::{self, MbapHeader, OutboundCommand, FIXED_TX_ID, MBAP_LEN};
use crate::interpret::{FrameInterpreter, FrameSummary};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpListener;
use tokio::sync::{watch, Mutex, RwLock};
use tracing::{info, warn};

/// 网关接入服务端配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayServerConfig {
    /// 监听端口
    pub listen_port: u16,
    /// 首次连接等待超时（毫秒）
    #[serde(default = "default_initial_timeout")]
    pub initial_timeout_ms: u64,
    /// 连接断开后的重连退避（毫秒）
    #[serde(default = "default_reconnect_backoff")]
    pub reconnect_backoff_ms: u64,
}

fn default_initial_timeout() -> u64 {
    30_000
}

fn default_reconnect_backoff() -> u64 {
    1_000
}

impl Default for GatewayServerConfig {
    fn default() -> Self {
        Self {
            listen_port: 8087,
            initial_timeout_ms: default_initial_timeout(),
            reconnect_backoff_ms: default_reconnect_backoff(),
        }
    }
}

impl GatewayServerConfig {
    /// 从 JSON 配置字符串解析
    pub fn from_json(json: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(json).map_err(|e| ProtocolError::ConfigParse(e.to_string()))
    }
}

/// 当前网关连接的共享写端。
///
/// 接收循环独占读端；所有出站帧（确认/错误应答、运维下发）都经由
/// 本句柄，内部互斥锁保证同一连接上的写入逐帧串行，避免并发组帧
/// 字节交错。连接断开或发送失败时句柄置空，后续发送快速失败。
#[derive(Clone)]
pub struct GatewayLink {
    writer: Arc<Mutex<Option<OwnedWriteHalf>>>,
}

impl GatewayLink {
    fn new() -> Self {
        Self {
            writer: Arc::new(Mutex::new(None)),
        }
    }

    /// 是否与网关保持连接
    pub async fn is_connected(&self) -> bool {
        self.writer.lock().await.is_some()
    }

    async fn attach(&self, writer: OwnedWriteHalf) {
        *self.writer.lock().await = Some(writer);
    }

    async fn detach(&self) {
        *self.writer.lock().await = None;
    }

    /// 发送一帧原始字节；未连接时返回 [`ProtocolError::NotConnected`]。
    pub async fn send_frame(&self, frame: &[u8]) -> Result<(), ProtocolError> {
        let mut guard = self.writer.lock().await;
        let writer = guard.as_mut().ok_or(ProtocolError::NotConnected)?;
        let result = async {
            writer.write_all(frame).await?;
            writer.flush().await
        }
        .await;
        if let Err(e) = result {
            // 发送失败视为连接不可用，置空句柄等待重连
            *guard = None;
            return Err(ProtocolError::Io(e));
        }
        Ok(())
    }

    /// 编码并下发一条出站命令帧（固定事务 ID），返回帧长。
    pub async fn send_command(
        &self,
        unit_id: u8,
        command: &OutboundCommand,
    ) -> Result<usize, ProtocolError> {
        let frame = command.encode(FIXED_TX_ID, unit_id)?;
        match self.send_frame(&frame).await {
            Ok(()) => {
                spraygw_telemetry::record_command_sent();
                info!(unit = unit_id, frame_len = frame.len(), "command frame sent");
                Ok(frame.len())
            }
            Err(e) => {
                spraygw_telemetry::record_command_send_failure();
                Err(e)
            }
        }
    }
}

/// 网关接入服务端
pub struct GatewayServer {
    config: GatewayServerConfig,
    interpreter: Arc<FrameInterpreter>,
    link: GatewayLink,
    last_summary: Arc<RwLock<Option<FrameSummary>>>,
    shutdown_tx: watch::Sender<bool>,
}

impl GatewayServer {
    pub fn new(config: GatewayServerConfig, interpreter: Arc<FrameInterpreter>) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            config,
            interpreter,
            link: GatewayLink::new(),
            last_summary: Arc::new(RwLock::new(None)),
            shutdown_tx,
        }
    }

    /// 共享连接句柄（供运维下发使用）
    pub fn link(&self) -> GatewayLink {
        self.link.clone()
    }

    /// 最近一帧的解析摘要
    pub async fn last_summary(&self) -> Option<FrameSummary> {
        self.last_summary.read().await.clone()
    }

    /// 请求关停：解除阻塞中的 accept/read，在途发送允许完成
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// 运行接收循环：监听 → 接入 → 逐帧读取，断开后退避重连
    pub async fn run(&self) -> Result<(), ProtocolError> {
        let addr = format!("0.0.0.0:{}", self.config.listen_port);
        let listener = TcpListener::bind(&addr).await?;
        let mut shutdown = self.shutdown_tx.subscribe();
        info!(
            "gateway server listening on {} (initial timeout {}ms)",
            addr, self.config.initial_timeout_ms
        );

        loop {
            if *shutdown.borrow() {
                break;
            }
            match self.accept_peer(&listener, &mut shutdown).await {
                Ok(Some(reader)) => {
                    if let Err(e) = self.read_cycle(reader, &mut shutdown).await {
                        warn!(error = %e, "gateway connection lost, reconnecting after backoff");
                        self.link.detach().await;
                        spraygw_telemetry::record_reconnect();
                        tokio::time::sleep(Duration::from_millis(self.config.reconnect_backoff_ms))
                            .await;
                    } else {
                        // 关停请求：正常退出读循环
                        self.link.detach().await;
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "failed to accept gateway connection");
                    tokio::time::sleep(Duration::from_millis(self.config.reconnect_backoff_ms))
                        .await;
                }
            }
        }

        info!("gateway server stopped");
        Ok(())
    }

    /// 阻塞等待唯一网关接入；关停时返回 `Ok(None)`
    async fn accept_peer(
        &self,
        listener: &TcpListener,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<Option<OwnedReadHalf>, ProtocolError> {
        tokio::select! {
            _ = shutdown.changed() => Ok(None),
            accepted = tokio::time::timeout(
                Duration::from_millis(self.config.initial_timeout_ms),
                listener.accept(),
            ) => match accepted {
                Ok(Ok((stream, peer_addr))) => {
                    info!("gateway peer connected: {}", peer_addr);
                    let (reader, writer) = stream.into_split();
                    self.link.attach(writer).await;
                    Ok(Some(reader))
                }
                Ok(Err(e)) => Err(ProtocolError::Io(e)),
                Err(_) => Err(ProtocolError::AcceptTimeout(self.config.initial_timeout_ms)),
            },
        }
    }

    /// 同一连接上的逐帧读取循环
    ///
    /// 帧级错误（协议标识不符、长度字段非法、声明长度不一致）丢帧或
    /// 回错误帧后继续；连接级错误向上返回触发重连。
    async fn read_cycle(
        &self,
        mut reader: OwnedReadHalf,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<(), ProtocolError> {
        loop {
            let mut header_buf = [0u8; MBAP_LEN];
            tokio::select! {
                _ = shutdown.changed() => return Ok(()),
                read = reader.read_exact(&mut header_buf) => {
                    read.map_err(|e| ProtocolError::HeaderReadFailed(e.to_string()))?;
                }
            }
            spraygw_telemetry::record_frame_received();

            let header = match MbapHeader::decode(&header_buf) {
                Ok(header) => header,
                Err(e) => {
                    // 帧级失败：按长度字段读掉本帧负载，保持连接与流同步
                    warn!(error = %e, "dropping frame with bad header");
                    spraygw_telemetry::record_decode_failure();
                    let length = u16::from_be_bytes([header_buf[4], header_buf[5]]);
                    if length > 1 {
                        let mut discard = vec![0u8; length as usize - 1];
                        reader
                            .read_exact(&mut discard)
                            .await
                            .map_err(|e| ProtocolError::PayloadReadFailed(e.to_string()))?;
                    }
                    continue;
                }
            };

            let pdu_len = match header.pdu_len() {
                Ok(len) => len,
                Err(e) => {
                    warn!(error = %e, tx = header.transaction_id, "dropping frame");
                    spraygw_telemetry::record_decode_failure();
                    continue;
                }
            };

            let mut pdu = vec![0u8; pdu_len];
            tokio::select! {
                _ = shutdown.changed() => return Ok(()),
                read = reader.read_exact(&mut pdu) => {
                    read.map_err(|e| ProtocolError::PayloadReadFailed(e.to_string()))?;
                }
            }

            // 声明长度校验：一致回确认帧，不一致回错误帧（-1），不关连接
            match frame::validate_and_respond(&header, &pdu) {
                Ok((declared, reply)) => {
                    if let Err(e) = self.link.send_frame(&reply).await {
                        warn!(error = %e, "failed to send reply frame");
                    }
                    if declared < 0 {
                        spraygw_telemetry::record_frame_rejected();
                        let mismatch = ProtocolError::LengthMismatch {
                            declared: u16::from_be_bytes([pdu[1], pdu[2]]) as usize,
                            actual: pdu.len().saturating_sub(3),
                        };
                        warn!(error = %mismatch, tx = header.transaction_id, "rejected telemetry frame");
                        continue;
                    }
                    spraygw_telemetry::record_frame_acked();
                }
                Err(e) => {
                    warn!(error = %e, "malformed pdu, frame dropped");
                    spraygw_telemetry::record_decode_failure();
                    continue;
                }
            }

            match self.interpreter.handle_frame(&header, &pdu).await {
                Ok(summary) => {
                    info!(
                        tx = summary.transaction_id,
                        unit = summary.unit_id,
                        data_len = summary.data_len,
                        "telemetry frame processed"
                    );
                    *self.last_summary.write().await = Some(summary);
                }
                Err(e) => {
                    spraygw_telemetry::record_decode_failure();
                    warn!(error = %e, "failed to interpret frame");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_config_with_defaults() {
        let json = r#"{"listen_port": 9000}"#;
        let config = GatewayServerConfig::from_json(json).unwrap();
        assert_eq!(config.listen_port, 9000);
        assert_eq!(config.initial_timeout_ms, 30_000);
        assert_eq!(config.reconnect_backoff_ms, 1_000);
    }

    #[tokio::test]
    async fn send_fails_fast_when_not_connected() {
        let link = GatewayLink::new();
        assert!(!link.is_connected().await);
        let err = link
            .send_command(
                1,
                &OutboundCommand::WriteSingleRegister {
                    address: 0,
                    value: 1,
                },
            )
            .await
            .expect_err("not connected");
        assert!(matches!(err, ProtocolError::NotConnected));
    }
}
