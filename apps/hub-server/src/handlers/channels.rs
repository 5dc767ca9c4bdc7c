//! 通道值 handlers
//!
//! - GET /users/{user_id}/devices/{device_id}/channels/{channel_id}
//! - POST .../char-value
//! - POST .../rgbw-value
//!
//! 写入只把命令交给设备链路；通道缓存值等设备回报后才变化。

use crate::AppState;
use crate::utils::response::{channel_error, channel_not_found, channel_to_dto, ok, rgbw_from_dto};
use api_contract::{CharValueRequest, RgbwValueRequest, WriteResultDto};
use axum::{
    Json,
    extract::{Path, State},
    response::Response,
};
use domain::{ChannelId, DeviceId, UserId};
use hub_channels::ChannelError;
use tracing::info;

#[derive(serde::Deserialize)]
pub struct ChannelPath {
    pub(crate) user_id: UserId,
    pub(crate) device_id: DeviceId,
    pub(crate) channel_id: ChannelId,
}

pub async fn get_channel_value(
    State(state): State<AppState>,
    Path(path): Path<ChannelPath>,
) -> Response {
    let Some(channel) =
        state
            .directory
            .channel_snapshot(path.user_id, path.device_id, path.channel_id)
    else {
        return channel_not_found();
    };
    let online = state
        .directory
        .is_device_online(path.user_id, path.device_id);
    ok(channel_to_dto(path.device_id, &channel, online))
}

pub async fn set_char_value(
    State(state): State<AppState>,
    Path(path): Path<ChannelPath>,
    Json(req): Json<CharValueRequest>,
) -> Response {
    let Some(registry) = state.directory.device_channels(path.user_id, path.device_id) else {
        return channel_not_found();
    };
    let result = registry
        .request_set_char_value(req.sender_id, path.channel_id, req.value)
        .await;
    write_response(&path, "char", result)
}

pub async fn set_rgbw_value(
    State(state): State<AppState>,
    Path(path): Path<ChannelPath>,
    Json(req): Json<RgbwValueRequest>,
) -> Response {
    let Some(registry) = state.directory.device_channels(path.user_id, path.device_id) else {
        return channel_not_found();
    };
    let result = registry
        .request_set_rgbw_value(req.sender_id, path.channel_id, rgbw_from_dto(req.value))
        .await;
    write_response(&path, "rgbw", result)
}

fn write_response(path: &ChannelPath, kind: &str, result: Result<bool, ChannelError>) -> Response {
    match result {
        Ok(accepted) => {
            info!(
                target: "hub.server",
                user_id = path.user_id,
                device_id = path.device_id,
                channel_id = path.channel_id,
                kind,
                accepted,
                "channel_write_requested"
            );
            ok(WriteResultDto { accepted })
        }
        Err(err) => channel_error(err),
    }
}
