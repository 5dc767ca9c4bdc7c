//! 设备通道加载（内存实现）

use crate::error::StorageError;
use crate::in_memory::InMemoryMqttDataStore;
use crate::models::{ChannelRecord, DeviceRecord};
use crate::traits::ChannelSource;
use domain::DeviceId;

#[async_trait::async_trait]
impl ChannelSource for InMemoryMqttDataStore {
    async fn load_devices(&self) -> Result<Vec<DeviceRecord>, StorageError> {
        let data = self.read()?;
        let devices = data
            .devices
            .values()
            .filter_map(|device| {
                let user = data.users.get(&device.user_id)?;
                Some(DeviceRecord {
                    user_id: device.user_id,
                    user_suid: user.row.user_suid.clone(),
                    device_id: device.device_id,
                })
            })
            .collect();
        Ok(devices)
    }

    async fn load_device_channels(
        &self,
        device_id: DeviceId,
    ) -> Result<Vec<ChannelRecord>, StorageError> {
        let data = self.read()?;
        Ok(data
            .channels
            .values()
            .filter(|channel| channel.device_id == device_id)
            .map(|channel| channel.to_record())
            .collect())
    }
}
