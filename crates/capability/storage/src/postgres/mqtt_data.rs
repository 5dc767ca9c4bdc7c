//! Postgres 行查询实现

use crate::error::StorageError;
use crate::models::{ChannelRow, DeviceRow, UserRow};
use crate::query::RowQuery;
use crate::traits::MqttDataStore;
use domain::{ChannelId, DeviceId, UserId};
use sqlx::{PgPool, Row};

pub struct PgMqttDataStore {
    pub pool: PgPool,
}

impl PgMqttDataStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let pool = crate::connection::connect_pool(database_url).await?;
        Ok(Self { pool })
    }
}

#[async_trait::async_trait]
impl MqttDataStore for PgMqttDataStore {
    async fn open_user_query(
        &self,
        user_id: Option<UserId>,
    ) -> Result<RowQuery<UserRow>, StorageError> {
        let rows = sqlx::query(
            "select u.id as user_id, u.short_unique_id as user_suid, \
             coalesce(u.email, '') as user_email, coalesce(u.timezone, '') as user_timezone \
             from supla_user u \
             where u.mqtt_broker_enabled = true and ($1::int4 is null or u.id = $1) \
             order by u.id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        let mut users = Vec::with_capacity(rows.len());
        for row in rows {
            users.push(UserRow {
                user_id: row.try_get("user_id")?,
                user_suid: row.try_get("user_suid")?,
                user_email: row.try_get("user_email")?,
                user_timezone: row.try_get("user_timezone")?,
            });
        }
        Ok(RowQuery::from_rows(users))
    }

    async fn open_device_query(
        &self,
        user_id: Option<UserId>,
        device_id: Option<DeviceId>,
    ) -> Result<RowQuery<DeviceRow>, StorageError> {
        let rows = sqlx::query(
            "select d.user_id, u.short_unique_id as user_suid, d.id as device_id, \
             d.enabled as device_enabled, \
             (extract(epoch from d.last_connected) * 1000)::int8 as device_last_connected_at_ms, \
             d.last_ipv4::text as device_last_ipv4, \
             coalesce(d.manufacturer_id, 0)::int4 as device_mfr_id, \
             coalesce(d.name, '') as device_name, \
             coalesce(d.proto_version, 0)::int4 as device_proto_version, \
             coalesce(d.software_version, '') as device_soft_ver \
             from supla_iodevice d join supla_user u on u.id = d.user_id \
             where u.mqtt_broker_enabled = true \
             and ($1::int4 is null or d.user_id = $1) \
             and ($2::int4 is null or d.id = $2) \
             order by d.user_id, d.id",
        )
        .bind(user_id)
        .bind(device_id)
        .fetch_all(&self.pool)
        .await?;
        let mut devices = Vec::with_capacity(rows.len());
        for row in rows {
            devices.push(DeviceRow {
                user_id: row.try_get("user_id")?,
                user_suid: row.try_get("user_suid")?,
                device_id: row.try_get("device_id")?,
                device_enabled: row.try_get("device_enabled")?,
                device_last_connected_at_ms: row.try_get("device_last_connected_at_ms")?,
                device_last_ipv4: row.try_get("device_last_ipv4")?,
                device_mfr_id: row.try_get("device_mfr_id")?,
                device_name: row.try_get("device_name")?,
                device_proto_version: row.try_get("device_proto_version")?,
                device_soft_ver: row.try_get("device_soft_ver")?,
            });
        }
        Ok(RowQuery::from_rows(devices))
    }

    async fn open_channel_query(
        &self,
        user_id: Option<UserId>,
        device_id: Option<DeviceId>,
        channel_id: Option<ChannelId>,
    ) -> Result<RowQuery<ChannelRow>, StorageError> {
        let rows = sqlx::query(
            "select c.user_id, u.short_unique_id as user_suid, c.iodevice_id as device_id, \
             c.id as channel_id, c.channel_number, c.type as channel_type, \
             c.func as channel_func, c.param1, c.param2, c.param3, \
             c.caption as channel_caption, coalesce(c.hidden, false) as channel_hidden \
             from supla_dev_channel c join supla_user u on u.id = c.user_id \
             where u.mqtt_broker_enabled = true \
             and ($1::int4 is null or c.user_id = $1) \
             and ($2::int4 is null or c.iodevice_id = $2) \
             and ($3::int4 is null or c.id = $3) \
             order by c.user_id, c.iodevice_id, c.id",
        )
        .bind(user_id)
        .bind(device_id)
        .bind(channel_id)
        .fetch_all(&self.pool)
        .await?;
        let mut channels = Vec::with_capacity(rows.len());
        for row in rows {
            channels.push(ChannelRow {
                user_id: row.try_get("user_id")?,
                user_suid: row.try_get("user_suid")?,
                device_id: row.try_get("device_id")?,
                channel_id: row.try_get("channel_id")?,
                channel_number: row.try_get("channel_number")?,
                channel_type: row.try_get("channel_type")?,
                channel_func: row.try_get("channel_func")?,
                channel_param1: row.try_get("param1")?,
                channel_param2: row.try_get("param2")?,
                channel_param3: row.try_get("param3")?,
                channel_caption: row.try_get("channel_caption")?,
                channel_hidden: row.try_get("channel_hidden")?,
            });
        }
        Ok(RowQuery::from_rows(channels))
    }
}
