//! 存储接口 Trait 定义
//!
//! - MqttDataStore：MQTT 抓取周期按实体种类打开行查询
//! - ChannelSource：设备目录预热与通道注册表重载
//!
//! 设计原则：
//! - 所有接口返回 StorageError
//! - 使用 async_trait 支持动态分发

use crate::error::StorageError;
use crate::models::{ChannelRecord, ChannelRow, DeviceRecord, DeviceRow, UserRow};
use crate::query::RowQuery;
use async_trait::async_trait;
use domain::{ChannelId, DeviceId, UserId};

/// MQTT 数据源的行查询接口。
///
/// 三种查询只返回启用了 MQTT 的用户名下的行；`None` 过滤条件表示不限。
#[async_trait]
pub trait MqttDataStore: Send + Sync {
    /// 打开用户查询
    async fn open_user_query(
        &self,
        user_id: Option<UserId>,
    ) -> Result<RowQuery<UserRow>, StorageError>;

    /// 打开设备查询
    async fn open_device_query(
        &self,
        user_id: Option<UserId>,
        device_id: Option<DeviceId>,
    ) -> Result<RowQuery<DeviceRow>, StorageError>;

    /// 打开通道查询
    async fn open_channel_query(
        &self,
        user_id: Option<UserId>,
        device_id: Option<DeviceId>,
        channel_id: Option<ChannelId>,
    ) -> Result<RowQuery<ChannelRow>, StorageError>;
}

/// 设备与通道的加载接口。
#[async_trait]
pub trait ChannelSource: Send + Sync {
    /// 列出全部设备及其归属用户
    async fn load_devices(&self) -> Result<Vec<DeviceRecord>, StorageError>;

    /// 加载指定设备的通道
    async fn load_device_channels(
        &self,
        device_id: DeviceId,
    ) -> Result<Vec<ChannelRecord>, StorageError>;
}
