//! 数据模型
//!
//! MQTT 抓取周期按实体种类读取的行结构，以及通道注册表加载使用的通道记录：
//! - UserRow：用户行（账户主题）
//! - DeviceRow：设备行（设备主题）
//! - ChannelRow：通道行（通道主题、状态主题、Home Assistant 发现配置）
//! - DeviceRecord / ChannelRecord：启动预热与注册表重载

use domain::{ChannelFunction, ChannelId, ChannelType, DeviceId, UserId};

/// 用户行。
#[derive(Debug, Clone, PartialEq)]
pub struct UserRow {
    pub user_id: UserId,
    pub user_suid: String,
    pub user_email: String,
    pub user_timezone: String,
}

/// 设备行。
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceRow {
    pub user_id: UserId,
    pub user_suid: String,
    pub device_id: DeviceId,
    pub device_enabled: bool,
    /// 最近一次连接时间（epoch 毫秒），从未连接为 `None`。
    pub device_last_connected_at_ms: Option<i64>,
    pub device_last_ipv4: Option<String>,
    pub device_mfr_id: i32,
    pub device_name: String,
    pub device_proto_version: i32,
    pub device_soft_ver: String,
}

/// 通道行。
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelRow {
    pub user_id: UserId,
    pub user_suid: String,
    pub device_id: DeviceId,
    pub channel_id: ChannelId,
    pub channel_number: i32,
    pub channel_type: i32,
    pub channel_func: i32,
    pub channel_param1: i32,
    pub channel_param2: i32,
    pub channel_param3: i32,
    pub channel_caption: Option<String>,
    pub channel_hidden: bool,
}

impl ChannelRow {
    pub fn channel_type(&self) -> ChannelType {
        ChannelType::from_code(self.channel_type)
    }

    pub fn function(&self) -> ChannelFunction {
        ChannelFunction::from_code(self.channel_func)
    }

    pub fn to_record(&self) -> ChannelRecord {
        ChannelRecord {
            channel_id: self.channel_id,
            channel_number: self.channel_number,
            channel_type: self.channel_type,
            channel_func: self.channel_func,
            param1: self.channel_param1,
            param2: self.channel_param2,
            param3: self.channel_param3,
        }
    }
}

/// 设备归属记录（目录预热使用）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRecord {
    pub user_id: UserId,
    pub user_suid: String,
    pub device_id: DeviceId,
}

/// 设备通道记录（注册表加载使用）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRecord {
    pub channel_id: ChannelId,
    pub channel_number: i32,
    pub channel_type: i32,
    pub channel_func: i32,
    pub param1: i32,
    pub param2: i32,
    pub param3: i32,
}
