//! 喷涂车间网关服务：接收控制器遥测帧并入库，推送实时报警，
//! 提供最新值查询与运维下发的管理 API。

mod handlers;
mod routes;
mod sinks;
mod utils;

use api_contract::AlarmItemDto;
use axum::{
    body::Body,
    http::{HeaderValue, Request},
    middleware::{self, Next},
    response::Response,
};
use spraygw_config::AppConfig;
use spraygw_protocol::{
    FrameInterpreter, GatewayLink, GatewayServer, GatewayServerConfig, MasterPollConfig,
    MasterPoller, NoopQualityProbe, PollPoint,
};
use spraygw_storage::{InMemoryReadingStore, PgReadingStore, ReadingStore};
use spraygw_telemetry::{init_tracing, new_request_ids};
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;
use tracing::Instrument;

/// 应用共享状态。
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ReadingStore>,
    pub link: GatewayLink,
    pub server: Arc<GatewayServer>,
    pub alarm_tx: broadcast::Sender<Vec<AlarmItemDto>>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 加载本地 .env（如存在），便于直接 cargo run 启动
    dotenvy::dotenv().ok();
    // 从环境变量加载运行配置
    let config = AppConfig::from_env()?;
    // 初始化结构化日志
    init_tracing();

    // 读数存储：配置了数据库走 Postgres，否则退化为内存存储（本地联调）
    let store: Arc<dyn ReadingStore> = match &config.database_url {
        Some(url) => Arc::new(PgReadingStore::connect(url).await?),
        None => {
            tracing::warn!("GW_DATABASE_URL not set, using in-memory reading store");
            Arc::new(InMemoryReadingStore::new())
        }
    };

    // 报警广播通道：解释器产出的报警批次推送给所有 SSE 订阅端
    let (alarm_tx, _) = broadcast::channel(64);

    let reading_sink = Arc::new(sinks::StoreReadingSink::new(store.clone()));
    let alarm_sink = Arc::new(sinks::BroadcastAlarmSink::new(alarm_tx.clone()));
    // 质量检测评分接口由部署方接入，默认空探针
    let interpreter = Arc::new(FrameInterpreter::new(
        reading_sink.clone(),
        alarm_sink,
        Arc::new(NoopQualityProbe),
    ));

    let server = Arc::new(GatewayServer::new(
        GatewayServerConfig {
            listen_port: config.gateway_listen_port,
            initial_timeout_ms: config.gateway_initial_timeout_ms,
            reconnect_backoff_ms: config.gateway_reconnect_backoff_ms,
        },
        interpreter,
    ));
    let link = server.link();

    // 网关接收循环（守护任务）
    {
        let server = Arc::clone(&server);
        tokio::spawn(async move {
            if let Err(e) = server.run().await {
                tracing::error!(error = %e, "gateway server exited");
            }
        });
    }

    // 主站轮询工具（可选，与接收通路并列）
    if config.master_enabled {
        let mut poller = MasterPoller::new(MasterPollConfig {
            host: config.master_host.clone(),
            port: config.master_port,
            poll_interval_ms: config.master_poll_interval_ms,
        });
        for point in master_points_from_env()? {
            poller.add_point(point);
        }
        let sink = reading_sink.clone();
        tokio::spawn(async move {
            if let Err(e) = poller.run(sink).await {
                tracing::error!(error = %e, "master poller exited");
            }
        });
    }

    let state = AppState {
        store,
        link,
        server: Arc::clone(&server),
        alarm_tx,
    };

    let app = routes::create_api_router()
        .with_state(state)
        .layer(
            tower::ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                // 注入 request_id/trace_id
                .layer(middleware::from_fn(request_context)),
        );

    let listener = tokio::net::TcpListener::bind(&config.http_addr).await?;
    tracing::info!("management api listening on {}", config.http_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(server))
        .await?;
    Ok(())
}

/// 等待 Ctrl-C 并请求网关接收循环关停（解除阻塞中的 accept/read）。
async fn shutdown_signal(server: Arc<GatewayServer>) {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
    server.shutdown();
}

/// 从 `GW_MASTER_POINTS`（JSON 数组）读取主站轮询点位。
fn master_points_from_env() -> Result<Vec<PollPoint>, Box<dyn std::error::Error>> {
    match std::env::var("GW_MASTER_POINTS") {
        Ok(json) if !json.is_empty() => {
            let points: Vec<PollPoint> = serde_json::from_str(&json)?;
            Ok(points)
        }
        _ => Ok(Vec::new()),
    }
}

async fn request_context(mut req: Request<Body>, next: Next) -> Response {
    // 生成 request_id 与 trace_id，并注入请求扩展与日志
    let ids = new_request_ids();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    req.extensions_mut().insert(ids.clone());

    let span = tracing::info_span!(
        "request",
        request_id = %ids.request_id,
        trace_id = %ids.trace_id,
        method = %method,
        path = %path
    );

    let mut response = next.run(req).instrument(span).await;
    response.headers_mut().insert(
        "x-request-id",
        HeaderValue::from_str(&ids.request_id).unwrap_or_else(|_| HeaderValue::from_static("")),
    );
    response.headers_mut().insert(
        "x-trace-id",
        HeaderValue::from_str(&ids.trace_id).unwrap_or_else(|_| HeaderValue::from_static("")),
    );
    response
}
