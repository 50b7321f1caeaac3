//! 数据库连接管理
//!
//! 提供读数库连接池初始化功能。网关为单实例低并发写入场景，
//! 最大连接数限制为 4。

use crate::error::StorageError;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// 建立 Postgres 连接池
///
/// # 参数
/// - `database_url`：Postgres 连接字符串
pub async fn connect_pool(database_url: &str) -> Result<PgPool, StorageError> {
    let pool = PgPoolOptions::new()
        .max_connections(4)
        .connect(database_url)
        .await?;
    Ok(pool)
}
