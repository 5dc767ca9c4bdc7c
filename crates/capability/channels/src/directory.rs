//! 用户 → 设备 → 通道注册表 的进程级目录。
//!
//! 目录本身只在注册/注销用户、挂载/卸载设备时写入；
//! 通道状态的读写都落在各设备自己的 `ChannelRegistry` 上。

use crate::channel::DeviceChannel;
use crate::registry::ChannelRegistry;
use crate::rpc::DeviceRpc;
use domain::{ChannelId, DeviceId, TempHum, UserId};
use hub_storage::{ChannelSource, StorageError};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::info;

struct DeviceEntry {
    registry: Arc<ChannelRegistry>,
    online: bool,
}

struct UserEntry {
    suid: String,
    devices: HashMap<DeviceId, DeviceEntry>,
}

/// 设备目录。
pub struct DeviceDirectory {
    users: RwLock<HashMap<UserId, UserEntry>>,
    rpc: Arc<dyn DeviceRpc>,
}

impl DeviceDirectory {
    pub fn new(rpc: Arc<dyn DeviceRpc>) -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            rpc,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<UserId, UserEntry>> {
        self.users.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<UserId, UserEntry>> {
        self.users.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// 注册用户；已存在时只更新 suid。
    pub fn register_user(&self, user_id: UserId, suid: impl Into<String>) {
        let suid = suid.into();
        let mut users = self.write();
        users
            .entry(user_id)
            .and_modify(|entry| entry.suid.clone_from(&suid))
            .or_insert_with(|| UserEntry {
                suid,
                devices: HashMap::new(),
            });
    }

    /// 注销用户及其全部设备。
    pub fn forget_user(&self, user_id: UserId) -> bool {
        self.write().remove(&user_id).is_some()
    }

    pub fn user_suid(&self, user_id: UserId) -> Option<String> {
        self.read().get(&user_id).map(|entry| entry.suid.clone())
    }

    /// 挂载设备；用户未注册返回 `None`，设备已挂载时返回已有注册表。
    pub fn attach_device(&self, user_id: UserId, device_id: DeviceId) -> Option<Arc<ChannelRegistry>> {
        let mut users = self.write();
        let user = users.get_mut(&user_id)?;
        let entry = user.devices.entry(device_id).or_insert_with(|| DeviceEntry {
            registry: Arc::new(ChannelRegistry::new(device_id, self.rpc.clone())),
            online: false,
        });
        Some(entry.registry.clone())
    }

    pub fn detach_device(&self, user_id: UserId, device_id: DeviceId) -> bool {
        self.write()
            .get_mut(&user_id)
            .and_then(|user| user.devices.remove(&device_id))
            .is_some()
    }

    /// 标记设备连接状态，设备未挂载返回 false。
    pub fn set_device_online(&self, user_id: UserId, device_id: DeviceId, online: bool) -> bool {
        let mut users = self.write();
        match users
            .get_mut(&user_id)
            .and_then(|user| user.devices.get_mut(&device_id))
        {
            Some(entry) => {
                entry.online = online;
                true
            }
            None => false,
        }
    }

    pub fn is_device_online(&self, user_id: UserId, device_id: DeviceId) -> bool {
        self.read()
            .get(&user_id)
            .and_then(|user| user.devices.get(&device_id))
            .map(|entry| entry.online)
            .unwrap_or(false)
    }

    pub fn device_channels(&self, user_id: UserId, device_id: DeviceId) -> Option<Arc<ChannelRegistry>> {
        self.read()
            .get(&user_id)
            .and_then(|user| user.devices.get(&device_id))
            .map(|entry| entry.registry.clone())
    }

    /// 读取单个通道的拷贝。目录锁在进入注册表之前释放。
    pub fn channel_snapshot(
        &self,
        user_id: UserId,
        device_id: DeviceId,
        channel_id: ChannelId,
    ) -> Option<DeviceChannel> {
        self.device_channels(user_id, device_id)?
            .find_by_id(channel_id)
    }

    /// 在用户全部设备中查找通道（关联传感器可能挂在另一台设备上）。
    pub fn find_user_channel(&self, user_id: UserId, channel_id: ChannelId) -> Option<DeviceChannel> {
        self.user_registries(user_id)
            .into_iter()
            .find_map(|registry| registry.find_by_id(channel_id))
    }

    /// 汇总用户全部设备的温湿度读数（按设备 id 排序）。
    pub fn temp_and_humidity(&self, user_id: UserId) -> Vec<TempHum> {
        self.user_registries(user_id)
            .iter()
            .flat_map(|registry| registry.collect_temp_humidity())
            .collect()
    }

    fn user_registries(&self, user_id: UserId) -> Vec<Arc<ChannelRegistry>> {
        let users = self.read();
        let Some(user) = users.get(&user_id) else {
            return Vec::new();
        };
        let mut registries: Vec<_> = user
            .devices
            .values()
            .map(|entry| entry.registry.clone())
            .collect();
        registries.sort_by_key(|registry| registry.device_id());
        registries
    }

    /// 启动预热：注册全部用户、挂载设备并加载通道。
    ///
    /// 设备列表读取失败时返回错误；单台设备的通道加载失败只记录日志。
    pub async fn load(&self, source: &dyn ChannelSource) -> Result<usize, StorageError> {
        let devices = source.load_devices().await?;
        let mut registries = Vec::with_capacity(devices.len());
        for device in &devices {
            self.register_user(device.user_id, device.user_suid.as_str());
            if let Some(registry) = self.attach_device(device.user_id, device.device_id) {
                registries.push(registry);
            }
        }

        let mut loaded = 0;
        for registry in registries {
            if registry.reload(source).await {
                loaded += 1;
            }
        }
        info!(
            target: "hub.channels",
            device_count = devices.len(),
            loaded_count = loaded,
            "directory_loaded"
        );
        Ok(loaded)
    }
}
