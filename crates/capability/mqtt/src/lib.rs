//! # Hub MQTT 模块
//!
//! 把用户/设备/通道与通道实时状态镜像到 MQTT 主题（含 Home Assistant 发现配置）。
//!
//! - [`provider`]：按下标寻址的消息提供者
//! - [`context`]：抓取范围与周期上下文
//! - [`enabled_users`]：启用 MQTT 的用户集合与周期关闭时的合并规则
//! - [`datasource`]：`PublisherDataSource` / `FetchCycle` 抓取状态机
//! - [`unpublisher`]：禁用用户的保留消息清除与延迟退订
//! - [`deletion`]：设备删除前的主题快照
//! - [`transport`]：发布/订阅/退订协作者（rumqttc 实现）
//! - [`publisher`]：周期驱动与事件循环

pub mod context;
pub mod datasource;
pub mod deletion;
pub mod enabled_users;
pub mod error;
pub mod homeassistant;
pub mod message;
pub mod provider;
pub mod publisher;
pub mod transport;
pub mod unpublisher;

pub use context::{MqttDsContext, Scope, Stage};
pub use datasource::{FetchCycle, PublisherDataSource};
pub use deletion::{DEVICE_SNAPSHOT_TTL, DeletedDeviceTopics};
pub use enabled_users::{EnabledUserSet, Transitions, UserAccumulator, UserRef};
pub use error::MqttError;
pub use message::MqttMessage;
pub use provider::{MessageProvider, ProviderCursor};
pub use publisher::{
    CycleReport, MqttPublisher, PublisherEvent, PublisherHandle, spawn_inbound_listener,
    spawn_publisher,
};
pub use transport::{MqttTransport, NoopTransport, RumqttTransport, RumqttTransportConfig};
pub use unpublisher::UnsubscribeScheduler;
