//! 用户/设备/通道内存存储

use crate::error::StorageError;
use crate::models::{ChannelRow, DeviceRow, UserRow};
use crate::query::RowQuery;
use crate::traits::MqttDataStore;
use domain::{ChannelFunction, ChannelId, DeviceId, UserId};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard};

#[derive(Debug, Clone)]
pub(crate) struct StoredUser {
    pub(crate) row: UserRow,
    pub(crate) mqtt_enabled: bool,
}

#[derive(Debug, Default)]
pub(crate) struct Dataset {
    pub(crate) users: BTreeMap<UserId, StoredUser>,
    pub(crate) devices: BTreeMap<DeviceId, DeviceRow>,
    pub(crate) channels: BTreeMap<ChannelId, ChannelRow>,
}

impl Dataset {
    fn suid_of(&self, user_id: UserId) -> Option<&str> {
        self.users.get(&user_id).map(|user| user.row.user_suid.as_str())
    }

    fn mqtt_enabled(&self, user_id: UserId) -> bool {
        self.users
            .get(&user_id)
            .map(|user| user.mqtt_enabled)
            .unwrap_or(false)
    }
}

/// MQTT 数据内存存储
///
/// 使用 RwLock + BTreeMap 保证查询结果按 id 有序。
pub struct InMemoryMqttDataStore {
    pub(crate) data: RwLock<Dataset>,
    available: AtomicBool,
}

impl InMemoryMqttDataStore {
    pub fn new() -> Self {
        Self {
            data: RwLock::new(Dataset::default()),
            available: AtomicBool::new(true),
        }
    }

    /// 切换可用状态；不可用时所有查询返回错误。
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// 新增或替换用户
    pub fn upsert_user(&self, row: UserRow, mqtt_enabled: bool) -> Result<(), StorageError> {
        let mut data = self
            .data
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        data.users
            .insert(row.user_id, StoredUser { row, mqtt_enabled });
        Ok(())
    }

    /// 修改用户的 MQTT 开关，用户不存在返回 false
    pub fn set_mqtt_enabled(&self, user_id: UserId, enabled: bool) -> Result<bool, StorageError> {
        let mut data = self
            .data
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        match data.users.get_mut(&user_id) {
            Some(user) => {
                user.mqtt_enabled = enabled;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// 删除用户及其名下设备和通道
    pub fn delete_user(&self, user_id: UserId) -> Result<bool, StorageError> {
        let mut data = self
            .data
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        let existed = data.users.remove(&user_id).is_some();
        data.devices.retain(|_, device| device.user_id != user_id);
        data.channels.retain(|_, channel| channel.user_id != user_id);
        Ok(existed)
    }

    /// 新增或替换设备
    pub fn upsert_device(&self, row: DeviceRow) -> Result<(), StorageError> {
        let mut data = self
            .data
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        data.devices.insert(row.device_id, row);
        Ok(())
    }

    /// 删除设备及其通道
    pub fn delete_device(&self, device_id: DeviceId) -> Result<bool, StorageError> {
        let mut data = self
            .data
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        let existed = data.devices.remove(&device_id).is_some();
        data.channels
            .retain(|_, channel| channel.device_id != device_id);
        Ok(existed)
    }

    /// 新增或替换通道
    pub fn upsert_channel(&self, row: ChannelRow) -> Result<(), StorageError> {
        let mut data = self
            .data
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        data.channels.insert(row.channel_id, row);
        Ok(())
    }

    /// 修改通道功能，通道不存在返回 false
    pub fn set_channel_function(
        &self,
        channel_id: ChannelId,
        function: ChannelFunction,
    ) -> Result<bool, StorageError> {
        let mut data = self
            .data
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        match data.channels.get_mut(&channel_id) {
            Some(channel) => {
                channel.channel_func = function.code();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub(crate) fn read(&self) -> Result<RwLockReadGuard<'_, Dataset>, StorageError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(StorageError::unavailable());
        }
        self.data
            .read()
            .map_err(|_| StorageError::new("lock failed"))
    }
}

impl Default for InMemoryMqttDataStore {
    fn default() -> Self {
        Self::new()
    }
}

fn matches_filter(filter: Option<i32>, value: i32) -> bool {
    filter.is_none_or(|expected| expected == value)
}

#[async_trait::async_trait]
impl MqttDataStore for InMemoryMqttDataStore {
    async fn open_user_query(
        &self,
        user_id: Option<UserId>,
    ) -> Result<RowQuery<UserRow>, StorageError> {
        let data = self.read()?;
        let rows = data
            .users
            .values()
            .filter(|user| user.mqtt_enabled && matches_filter(user_id, user.row.user_id))
            .map(|user| user.row.clone())
            .collect();
        Ok(RowQuery::from_rows(rows))
    }

    async fn open_device_query(
        &self,
        user_id: Option<UserId>,
        device_id: Option<DeviceId>,
    ) -> Result<RowQuery<DeviceRow>, StorageError> {
        let data = self.read()?;
        let rows = data
            .devices
            .values()
            .filter(|device| {
                data.mqtt_enabled(device.user_id)
                    && matches_filter(user_id, device.user_id)
                    && matches_filter(device_id, device.device_id)
            })
            .filter_map(|device| {
                let suid = data.suid_of(device.user_id)?;
                let mut row = device.clone();
                row.user_suid = suid.to_string();
                Some(row)
            })
            .collect();
        Ok(RowQuery::from_rows(rows))
    }

    async fn open_channel_query(
        &self,
        user_id: Option<UserId>,
        device_id: Option<DeviceId>,
        channel_id: Option<ChannelId>,
    ) -> Result<RowQuery<ChannelRow>, StorageError> {
        let data = self.read()?;
        let rows = data
            .channels
            .values()
            .filter(|channel| {
                data.mqtt_enabled(channel.user_id)
                    && data.devices.contains_key(&channel.device_id)
                    && matches_filter(user_id, channel.user_id)
                    && matches_filter(device_id, channel.device_id)
                    && matches_filter(channel_id, channel.channel_id)
            })
            .filter_map(|channel| {
                let suid = data.suid_of(channel.user_id)?;
                let mut row = channel.clone();
                row.user_suid = suid.to_string();
                Some(row)
            })
            .collect();
        Ok(RowQuery::from_rows(rows))
    }
}
