//! HTTP 响应辅助函数和 DTO 转换
//!
//! 所有错误返回统一的 ApiResponse 格式，HTTP 状态码与错误码对应。

use api_contract::{ApiResponse, ChannelValueDto, RgbwValueDto};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use domain::RgbwValue;
use hub_channels::{ChannelError, DeviceChannel};

/// 成功响应
pub fn ok<T: serde::Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(ApiResponse::success(data))).into_response()
}

/// 通道（或其所属设备）未找到
pub fn channel_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::<()>::error(
            "CHANNEL.NOT_FOUND",
            "channel not found",
        )),
    )
        .into_response()
}

/// 设备未挂载
pub fn device_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::<()>::error("DEVICE.NOT_FOUND", "device not found")),
    )
        .into_response()
}

/// 设备链路不可用
pub fn channel_error(err: ChannelError) -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ApiResponse::<()>::error("DEVICE.UNAVAILABLE", err.to_string())),
    )
        .into_response()
}

pub fn mqtt_disabled() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ApiResponse::<()>::error("MQTT.DISABLED", "mqtt publisher disabled")),
    )
        .into_response()
}

pub fn mqtt_stopped(message: impl Into<String>) -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ApiResponse::<()>::error("MQTT.STOPPED", message.into())),
    )
        .into_response()
}

/// DeviceChannel 转 ChannelValueDto
pub fn channel_to_dto(device_id: i32, channel: &DeviceChannel, online: bool) -> ChannelValueDto {
    let temp_hum = channel.temp_hum();
    ChannelValueDto {
        channel_id: channel.id(),
        device_id,
        number: channel.number(),
        channel_type: channel.channel_type().name().to_string(),
        function: channel.function().name().to_string(),
        raw: channel.value().to_vec(),
        double_value: channel.double_value(),
        char_value: channel.char_value(),
        rgbw: channel.rgbw_value().map(rgbw_to_dto),
        temperature: temp_hum.map(|reading| reading.temperature),
        humidity: temp_hum.and_then(|reading| reading.humidity),
        online,
    }
}

pub fn rgbw_to_dto(value: RgbwValue) -> RgbwValueDto {
    RgbwValueDto {
        color: value.color,
        color_brightness: value.color_brightness,
        brightness: value.brightness,
    }
}

pub fn rgbw_from_dto(value: RgbwValueDto) -> RgbwValue {
    RgbwValue {
        color: value.color,
        color_brightness: value.color_brightness,
        brightness: value.brightness,
    }
}
