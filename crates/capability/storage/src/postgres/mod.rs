//! # PostgreSQL 存储实现模块
//!
//! - **MqttDataStore** (`mqtt_data.rs`)：用户/设备/通道行查询
//! - **ChannelSource** (`channel.rs`)：设备列表与设备通道加载
//!
//! ## 依赖的表
//!
//! - `supla_user`：id, short_unique_id, email, timezone, mqtt_broker_enabled
//! - `supla_iodevice`：id, user_id, enabled, last_connected, last_ipv4, manufacturer_id,
//!   name, proto_version, software_version
//! - `supla_dev_channel`：id, iodevice_id, user_id, channel_number, type, func,
//!   param1, param2, param3, caption, hidden
//!
//! 可选过滤条件统一写成 `($n::int4 is null or col = $n)`，一条语句覆盖全部作用域。

pub mod channel;
pub mod mqtt_data;

pub use channel::*;
pub use mqtt_data::*;
