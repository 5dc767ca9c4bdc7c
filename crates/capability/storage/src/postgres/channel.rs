//! Postgres 设备通道加载

use crate::error::StorageError;
use crate::models::{ChannelRecord, DeviceRecord};
use crate::traits::ChannelSource;
use domain::DeviceId;
use sqlx::{PgPool, Row};

pub struct PgChannelSource {
    pub pool: PgPool,
}

impl PgChannelSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ChannelSource for PgChannelSource {
    async fn load_devices(&self) -> Result<Vec<DeviceRecord>, StorageError> {
        let rows = sqlx::query(
            "select d.user_id, u.short_unique_id as user_suid, d.id as device_id \
             from supla_iodevice d join supla_user u on u.id = d.user_id \
             order by d.user_id, d.id",
        )
        .fetch_all(&self.pool)
        .await?;
        let mut devices = Vec::with_capacity(rows.len());
        for row in rows {
            devices.push(DeviceRecord {
                user_id: row.try_get("user_id")?,
                user_suid: row.try_get("user_suid")?,
                device_id: row.try_get("device_id")?,
            });
        }
        Ok(devices)
    }

    async fn load_device_channels(
        &self,
        device_id: DeviceId,
    ) -> Result<Vec<ChannelRecord>, StorageError> {
        let rows = sqlx::query(
            "select id, channel_number, type, func, param1, param2, param3 \
             from supla_dev_channel where iodevice_id = $1 order by channel_number",
        )
        .bind(device_id)
        .fetch_all(&self.pool)
        .await?;
        let mut channels = Vec::with_capacity(rows.len());
        for row in rows {
            channels.push(ChannelRecord {
                channel_id: row.try_get("id")?,
                channel_number: row.try_get("channel_number")?,
                channel_type: row.try_get("type")?,
                channel_func: row.try_get("func")?,
                param1: row.try_get("param1")?,
                param2: row.try_get("param2")?,
                param3: row.try_get("param3")?,
            });
        }
        Ok(channels)
    }
}
