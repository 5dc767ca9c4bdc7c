//! 设备通道注册表
//!
//! 每个设备一个注册表，所有访问都经过同一把互斥锁（读也串行）。
//! 锁只保护内存集合：数据库加载在加锁前完成，RPC 发送在解锁后进行。

use crate::channel::DeviceChannel;
use crate::error::ChannelError;
use crate::rpc::{ChannelNewValue, DeviceRpc};
use domain::{
    ChannelFunction, ChannelId, ChannelType, DeviceId, ElectricityMeasurement, RawValue,
    RgbwValue, TempHum,
};
use hub_storage::{ChannelRecord, ChannelSource};
use hub_telemetry::{record_channel_value_dispatched, record_registry_reload_failure};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{info, warn};

/// 线程安全的设备通道集合。
pub struct ChannelRegistry {
    device_id: DeviceId,
    channels: Mutex<Vec<DeviceChannel>>,
    rpc: Arc<dyn DeviceRpc>,
}

impl ChannelRegistry {
    pub fn new(device_id: DeviceId, rpc: Arc<dyn DeviceRpc>) -> Self {
        Self {
            device_id,
            channels: Mutex::new(Vec::new()),
            rpc,
        }
    }

    pub fn device_id(&self) -> DeviceId {
        self.device_id
    }

    fn lock(&self) -> MutexGuard<'_, Vec<DeviceChannel>> {
        // 每个临界区结束时集合都是完整的，中毒后可以继续使用。
        self.channels.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 新增通道；id 已存在时不做任何事。返回是否插入。
    #[allow(clippy::too_many_arguments)]
    pub fn add_channel(
        &self,
        id: ChannelId,
        number: i32,
        channel_type: ChannelType,
        function: ChannelFunction,
        param1: i32,
        param2: i32,
        param3: i32,
    ) -> bool {
        let mut channels = self.lock();
        insert_channel(
            &mut channels,
            DeviceChannel::new(id, number, channel_type, function, [param1, param2, param3]),
        )
    }

    /// 从数据库重载通道。
    ///
    /// 只有加载成功才清空并重建；失败时保留旧内容并返回 false。
    pub async fn reload(&self, source: &dyn ChannelSource) -> bool {
        let records = match source.load_device_channels(self.device_id).await {
            Ok(records) => records,
            Err(err) => {
                record_registry_reload_failure();
                warn!(
                    target: "hub.channels",
                    device_id = self.device_id,
                    error = %err,
                    "registry_reload_failed"
                );
                return false;
            }
        };

        let mut channels = self.lock();
        channels.clear();
        for record in &records {
            insert_channel(&mut channels, channel_from_record(record));
        }
        info!(
            target: "hub.channels",
            device_id = self.device_id,
            channel_count = channels.len(),
            "registry_reloaded"
        );
        true
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// 按 id 查找，返回加锁时刻的通道拷贝。
    pub fn find_by_id(&self, id: ChannelId) -> Option<DeviceChannel> {
        self.lock().iter().find(|channel| channel.id() == id).cloned()
    }

    /// 按设备内编号查找。
    pub fn find_by_number(&self, number: i32) -> Option<DeviceChannel> {
        self.lock()
            .iter()
            .find(|channel| channel.number() == number)
            .cloned()
    }

    /// 全部通道的拷贝（按插入顺序）。
    pub fn channels(&self) -> Vec<DeviceChannel> {
        self.lock().clone()
    }

    pub fn channel_exists(&self, id: ChannelId) -> bool {
        self.with_channel(id, |_| ()).is_some()
    }

    pub fn channel_id_by_number(&self, number: i32) -> Option<ChannelId> {
        self.lock()
            .iter()
            .find(|channel| channel.number() == number)
            .map(DeviceChannel::id)
    }

    pub fn channel_function(&self, id: ChannelId) -> Option<ChannelFunction> {
        self.with_channel(id, DeviceChannel::function)
    }

    pub fn value(&self, id: ChannelId) -> Option<RawValue> {
        self.with_channel(id, DeviceChannel::value)
    }

    pub fn double_value(&self, id: ChannelId) -> Option<f64> {
        self.with_channel(id, DeviceChannel::double_value)
    }

    pub fn char_value(&self, id: ChannelId) -> Option<u8> {
        self.with_channel(id, DeviceChannel::char_value)
    }

    /// 通道不存在或类型不支持 RGBW 时返回 `None`。
    pub fn rgbw_value(&self, id: ChannelId) -> Option<RgbwValue> {
        self.with_channel(id, DeviceChannel::rgbw_value).flatten()
    }

    pub fn temp_and_humidity(&self, id: ChannelId) -> Option<TempHum> {
        self.with_channel(id, DeviceChannel::temp_hum).flatten()
    }

    pub fn temperature(&self, id: ChannelId) -> Option<f64> {
        self.temp_and_humidity(id).map(|reading| reading.temperature)
    }

    /// 仅温湿度一体读数有湿度。
    pub fn humidity(&self, id: ChannelId) -> Option<f64> {
        self.temp_and_humidity(id).and_then(|reading| reading.humidity)
    }

    /// 写入设备上报值，返回通道是否存在。
    pub fn set_value(&self, id: ChannelId, value: &RawValue) -> bool {
        self.with_channel_mut(id, |channel| channel.set_value(value))
            .is_some()
    }

    /// 按通道编号批量写入上报值，返回实际更新的通道数。
    pub fn set_channels_value(&self, reports: &[(i32, RawValue)]) -> usize {
        let mut channels = self.lock();
        let mut updated = 0;
        for (number, value) in reports {
            if let Some(channel) = channels.iter_mut().find(|channel| channel.number() == *number) {
                channel.set_value(value);
                updated += 1;
            }
        }
        updated
    }

    pub fn set_extended_value(&self, id: ChannelId, measurement: ElectricityMeasurement) -> bool {
        self.with_channel_mut(id, |channel| channel.set_extended_value(measurement))
            .is_some()
    }

    pub fn is_value_writable(&self, id: ChannelId) -> bool {
        self.with_channel(id, DeviceChannel::is_value_writable)
            .unwrap_or(false)
    }

    pub fn is_char_value_writable(&self, id: ChannelId) -> bool {
        self.with_channel(id, DeviceChannel::is_char_value_writable)
            .unwrap_or(false)
    }

    pub fn is_rgbw_value_writable(&self, id: ChannelId) -> bool {
        self.with_channel(id, DeviceChannel::is_rgbw_value_writable)
            .unwrap_or(false)
    }

    pub fn value_duration_ms(&self, id: ChannelId) -> u32 {
        self.with_channel(id, DeviceChannel::value_duration_ms)
            .unwrap_or(0)
    }

    pub fn master_channel(&self, id: ChannelId) -> Option<ChannelId> {
        self.with_channel(id, DeviceChannel::master_channel).flatten()
    }

    pub fn slave_channel(&self, id: ChannelId) -> Option<ChannelId> {
        self.with_channel(id, DeviceChannel::slave_channel).flatten()
    }

    /// 汇总所有可解码的温湿度读数（按通道顺序）。
    pub fn collect_temp_humidity(&self) -> Vec<TempHum> {
        self.lock().iter().filter_map(DeviceChannel::temp_hum).collect()
    }

    /// 请求设备写入原始值。
    ///
    /// 通道不存在或不可写返回 `Ok(false)`；命令交给 RPC 后返回 `Ok(true)`。
    pub async fn request_set_value(
        &self,
        sender_id: i32,
        id: ChannelId,
        value: RawValue,
    ) -> Result<bool, ChannelError> {
        let command = self.prepare_command(sender_id, id, DeviceChannel::is_value_writable, |_| value);
        self.dispatch(command).await
    }

    pub async fn request_set_char_value(
        &self,
        sender_id: i32,
        id: ChannelId,
        char_value: u8,
    ) -> Result<bool, ChannelError> {
        let command = self.prepare_command(
            sender_id,
            id,
            DeviceChannel::is_char_value_writable,
            |channel| channel.assign_char_value(char_value),
        );
        self.dispatch(command).await
    }

    pub async fn request_set_rgbw_value(
        &self,
        sender_id: i32,
        id: ChannelId,
        rgbw: RgbwValue,
    ) -> Result<bool, ChannelError> {
        let command = self.prepare_command(
            sender_id,
            id,
            DeviceChannel::is_rgbw_value_writable,
            |channel| channel.assign_rgbw_value(rgbw),
        );
        self.dispatch(command).await
    }

    fn prepare_command(
        &self,
        sender_id: i32,
        id: ChannelId,
        writable: fn(&DeviceChannel) -> bool,
        assemble: impl FnOnce(&DeviceChannel) -> RawValue,
    ) -> Option<ChannelNewValue> {
        let channels = self.lock();
        let channel = channels.iter().find(|channel| channel.id() == id)?;
        if !writable(channel) {
            return None;
        }
        Some(ChannelNewValue {
            device_id: self.device_id,
            channel_number: channel.number(),
            sender_id,
            duration_ms: channel.value_duration_ms(),
            value: assemble(channel),
        })
    }

    async fn dispatch(&self, command: Option<ChannelNewValue>) -> Result<bool, ChannelError> {
        let Some(command) = command else {
            return Ok(false);
        };
        let channel_number = command.channel_number;
        let sender_id = command.sender_id;
        if let Err(err) = self.rpc.send_set_channel_value(command).await {
            warn!(
                target: "hub.channels",
                device_id = self.device_id,
                channel_number,
                error = %err,
                "channel_value_dispatch_failed"
            );
            return Err(err.into());
        }
        record_channel_value_dispatched();
        info!(
            target: "hub.channels",
            device_id = self.device_id,
            channel_number,
            sender_id,
            "channel_value_dispatched"
        );
        Ok(true)
    }

    fn with_channel<T>(&self, id: ChannelId, read: impl FnOnce(&DeviceChannel) -> T) -> Option<T> {
        self.lock().iter().find(|channel| channel.id() == id).map(read)
    }

    fn with_channel_mut<T>(
        &self,
        id: ChannelId,
        write: impl FnOnce(&mut DeviceChannel) -> T,
    ) -> Option<T> {
        self.lock()
            .iter_mut()
            .find(|channel| channel.id() == id)
            .map(write)
    }
}

fn channel_from_record(record: &ChannelRecord) -> DeviceChannel {
    DeviceChannel::new(
        record.channel_id,
        record.channel_number,
        ChannelType::from_code(record.channel_type),
        ChannelFunction::from_code(record.channel_func),
        [record.param1, record.param2, record.param3],
    )
}

fn insert_channel(channels: &mut Vec<DeviceChannel>, channel: DeviceChannel) -> bool {
    if channels.iter().any(|existing| existing.id() == channel.id()) {
        return false;
    }
    if channels.try_reserve(1).is_err() {
        warn!(target: "hub.channels", channel_id = channel.id(), "channel_insert_failed");
        return false;
    }
    channels.push(channel);
    true
}
