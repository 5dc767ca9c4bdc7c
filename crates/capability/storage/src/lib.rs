//! # Hub Storage 模块
//!
//! 为通道注册表与 MQTT 发布链路提供数据库协作者。
//!
//! - [`models`]：用户/设备/通道行与注册表加载记录
//! - [`query`]：行查询游标 `RowQuery`
//! - [`traits`]：`MqttDataStore`、`ChannelSource`
//! - [`in_memory`]：内存实现（测试与本地演示），可切换为不可用以模拟断库
//! - [`postgres`]：PostgreSQL 实现
//!
//! 查询在打开时即缓冲全部结果行，游标本身不持有数据库连接。

pub mod connection;
pub mod error;
pub mod in_memory;
pub mod models;
pub mod postgres;
pub mod query;
pub mod traits;

pub use connection::*;
pub use error::*;
pub use models::*;
pub use query::RowQuery;
pub use traits::*;

pub use in_memory::InMemoryMqttDataStore;
pub use postgres::{PgChannelSource, PgMqttDataStore};
