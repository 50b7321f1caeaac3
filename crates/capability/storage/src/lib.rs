//! # 读数存储模块
//!
//! 本模块提供读数记录的统一存储抽象层，支持多种存储后端实现。
//!
//! ## 架构设计
//!
//! 1. **接口抽象层** (`traits.rs`)：定义读数存储的异步 Trait 接口
//! 2. **数据模型层** (`models.rs`)：最新值查询返回的行结构
//! 3. **错误处理层** (`error.rs`)：统一的存储错误类型
//! 4. **连接管理层** (`connection.rs`)：数据库连接池管理
//! 5. **实现层**：
//!    - `in_memory`：内存存储实现（用于测试和本地联调）
//!    - `postgres`：PostgreSQL 存储实现（生产环境使用）
//!
//! ## 存储模型
//!
//! 每帧解码出的读数按记录族分表：
//!
//! - **device_status**：设备状态（dev_name, status, ts）
//! - **sensor**：传感器模拟量（dev_name, value, ts）
//! - **spray_record**：喷涂记录/质量检测评分（dev_name, rate, ts）
//! - **product_hourly**：当日每时产量（num_hourly, ts）
//! - **product_week**：当月每周产量（num_weekly, ts）
//!
//! 入库一次一条；最新值查询按时间倒序取第一条。
//!
//! ## 设计约束
//!
//! - **禁止直接 SQL**：Handler 层禁止直接写 SQL，统一通过 storage 层
//! - **参数化查询**：所有 SQL 使用参数绑定，防止 SQL 注入

pub mod connection;
pub mod error;
pub mod in_memory;
pub mod models;
pub mod postgres;
pub mod traits;

pub use connection::*;
pub use error::*;
pub use in_memory::InMemoryReadingStore;
pub use models::*;
pub use postgres::PgReadingStore;
pub use traits::*;
