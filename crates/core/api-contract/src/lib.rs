//! 稳定的 DTO 与 API 响应契约。

use serde::{Deserialize, Serialize};

/// 标准 API 响应封装。
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

/// 失败响应的错误体。
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                code: code.into(),
                message: message.into(),
            }),
        }
    }
}

/// RGBW 语义值（颜色为 0xRRGGBB）。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RgbwValueDto {
    pub color: u32,
    #[serde(alias = "color_brightness")]
    pub color_brightness: u8,
    pub brightness: u8,
}

/// 通道当前值的解码视图。
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChannelValueDto {
    pub channel_id: i32,
    pub device_id: i32,
    pub number: i32,
    #[serde(rename = "type")]
    pub channel_type: String,
    pub function: String,
    /// 8 字节原始缓冲区。
    pub raw: Vec<u8>,
    pub double_value: f64,
    pub char_value: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rgbw: Option<RgbwValueDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    pub online: bool,
}

/// 写入单字节值请求体。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharValueRequest {
    pub value: u8,
    #[serde(default, alias = "sender_id")]
    pub sender_id: i32,
}

/// 写入 RGBW 值请求体。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RgbwValueRequest {
    #[serde(flatten)]
    pub value: RgbwValueDto,
    #[serde(default, alias = "sender_id")]
    pub sender_id: i32,
}

/// 写入请求的结果。`accepted = false` 表示通道不存在或不可写。
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WriteResultDto {
    pub accepted: bool,
}

/// MQTT 刷新请求的结果。
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MqttRefreshDto {
    pub user_id: i32,
    pub queued: bool,
}

/// 设备连接状态上报请求体。
#[derive(Debug, Deserialize)]
pub struct DeviceOnlineRequest {
    pub online: bool,
}

/// 单个通道（按通道编号）的 8 字节上报值。
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ChannelValueReport {
    pub number: i32,
    pub value: [u8; 8],
}

/// 设备批量上报通道值请求体。
#[derive(Debug, Deserialize)]
pub struct ChannelValuesRequest {
    pub values: Vec<ChannelValueReport>,
}

/// 设备上报的处理结果。`mqtt_queued` 表示已通知发布器。
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeviceReportDto {
    pub updated: usize,
    pub mqtt_queued: bool,
}

/// 设备删除通知的结果。
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDeletionDto {
    pub device_id: i32,
    /// 删除前记录的主题数；删除后通知时为 0。
    pub topics: usize,
    pub queued: bool,
}

/// 运行期计数器快照。
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshotDto {
    pub cycles_opened: u64,
    pub cycles_rejected: u64,
    pub cycle_latency_ms_total: u64,
    pub cycle_latency_ms_count: u64,
    pub messages_published: u64,
    pub publish_failures: u64,
    pub unsubscribes_scheduled: u64,
    pub unsubscribes_cancelled: u64,
    pub unsubscribes_executed: u64,
    pub registry_reload_failures: u64,
    pub channel_values_dispatched: u64,
}
