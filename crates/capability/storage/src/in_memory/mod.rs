//! 内存存储实现模块
//!
//! 仅用于本地演示和测试。
//!
//! `InMemoryMqttDataStore` 同时实现：
//! - MqttDataStore：按用户/设备/通道打开行查询
//! - ChannelSource：设备列表与设备通道加载
//!
//! 通过 `set_available(false)` 可模拟数据库不可达。

pub mod channel;
pub mod mqtt_data;

pub use mqtt_data::*;
