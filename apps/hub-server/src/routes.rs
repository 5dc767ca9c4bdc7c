//! 路由定义
//!
//! - 健康检查：/health
//! - 计数器快照：/metrics
//! - 通道值读写：/users/{user_id}/devices/{device_id}/channels/{channel_id}[/char-value|/rgbw-value]
//! - 设备上报：/users/{user_id}/devices/{device_id}/online、/values
//! - 设备删除：/users/{user_id}/devices/{device_id}/mqtt/before-delete、/mqtt/deleted
//! - MQTT 手动刷新：/users/{user_id}/mqtt/refresh

use super::AppState;
use super::handlers::*;
use axum::{
    Router,
    routing::{get, post},
};

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(get_metrics))
        .route(
            "/users/:user_id/devices/:device_id/channels/:channel_id",
            get(get_channel_value),
        )
        .route(
            "/users/:user_id/devices/:device_id/channels/:channel_id/char-value",
            post(set_char_value),
        )
        .route(
            "/users/:user_id/devices/:device_id/channels/:channel_id/rgbw-value",
            post(set_rgbw_value),
        )
        .route(
            "/users/:user_id/devices/:device_id/online",
            post(set_device_online),
        )
        .route(
            "/users/:user_id/devices/:device_id/values",
            post(report_channel_values),
        )
        .route(
            "/users/:user_id/devices/:device_id/mqtt/before-delete",
            post(before_device_delete),
        )
        .route(
            "/users/:user_id/devices/:device_id/mqtt/deleted",
            post(device_deleted),
        )
        .route("/users/:user_id/mqtt/refresh", post(refresh_user))
}
