//! 设备链路上报 handlers
//!
//! - POST /users/{user_id}/devices/{device_id}/online：连接状态
//! - POST /users/{user_id}/devices/{device_id}/values：按通道编号批量上报值
//! - POST /users/{user_id}/devices/{device_id}/mqtt/before-delete：删除前记录主题
//! - POST /users/{user_id}/devices/{device_id}/mqtt/deleted：删除后清除主题
//!
//! 目录更新后通知发布器；MQTT 关闭时只更新目录。

use crate::AppState;
use crate::utils::response::{device_not_found, mqtt_disabled, mqtt_stopped, ok};
use api_contract::{
    ChannelValuesRequest, DeviceDeletionDto, DeviceOnlineRequest, DeviceReportDto,
};
use axum::{
    Json,
    extract::{Path, State},
    response::Response,
};
use domain::{DeviceId, UserId};
use hub_mqtt::MqttError;
use tracing::{info, warn};

#[derive(serde::Deserialize)]
pub struct DevicePath {
    pub(crate) user_id: UserId,
    pub(crate) device_id: DeviceId,
}

pub async fn set_device_online(
    State(state): State<AppState>,
    Path(path): Path<DevicePath>,
    Json(req): Json<DeviceOnlineRequest>,
) -> Response {
    if !state
        .directory
        .set_device_online(path.user_id, path.device_id, req.online)
    {
        return device_not_found();
    }
    info!(
        target: "hub.server",
        user_id = path.user_id,
        device_id = path.device_id,
        online = req.online,
        "device_online_reported"
    );

    let mqtt_queued = match state.publisher.as_ref() {
        Some(publisher) => notified(
            publisher
                .on_device_changed(path.user_id, path.device_id)
                .await,
        ),
        None => false,
    };
    ok(DeviceReportDto {
        updated: 1,
        mqtt_queued,
    })
}

pub async fn report_channel_values(
    State(state): State<AppState>,
    Path(path): Path<DevicePath>,
    Json(req): Json<ChannelValuesRequest>,
) -> Response {
    let Some(registry) = state.directory.device_channels(path.user_id, path.device_id) else {
        return device_not_found();
    };
    let reports: Vec<_> = req
        .values
        .iter()
        .map(|report| (report.number, report.value))
        .collect();
    let updated = registry.set_channels_value(&reports);

    let mut mqtt_queued = false;
    if let Some(publisher) = state.publisher.as_ref() {
        mqtt_queued = true;
        for report in &req.values {
            let Some(channel_id) = registry.channel_id_by_number(report.number) else {
                continue;
            };
            let result = publisher
                .on_channel_state_changed(path.user_id, path.device_id, channel_id)
                .await;
            if !notified(result) {
                mqtt_queued = false;
                break;
            }
        }
    }
    ok(DeviceReportDto {
        updated,
        mqtt_queued,
    })
}

pub async fn before_device_delete(
    State(state): State<AppState>,
    Path(path): Path<DevicePath>,
) -> Response {
    let Some(publisher) = state.publisher.as_ref() else {
        return mqtt_disabled();
    };
    match publisher
        .before_device_delete(path.user_id, path.device_id)
        .await
    {
        Ok(topics) => ok(DeviceDeletionDto {
            device_id: path.device_id,
            topics,
            queued: false,
        }),
        Err(err) => mqtt_stopped(err.to_string()),
    }
}

pub async fn device_deleted(
    State(state): State<AppState>,
    Path(path): Path<DevicePath>,
) -> Response {
    state.directory.detach_device(path.user_id, path.device_id);
    let Some(publisher) = state.publisher.as_ref() else {
        return mqtt_disabled();
    };
    match publisher
        .on_device_deleted(path.user_id, path.device_id)
        .await
    {
        Ok(()) => ok(DeviceDeletionDto {
            device_id: path.device_id,
            topics: 0,
            queued: true,
        }),
        Err(err) => mqtt_stopped(err.to_string()),
    }
}

fn notified(result: Result<(), MqttError>) -> bool {
    match result {
        Ok(()) => true,
        Err(err) => {
            warn!(target: "hub.server", error = %err, "mqtt_notify_failed");
            false
        }
    }
}
