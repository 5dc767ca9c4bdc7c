//! MQTT 手动刷新
//!
//! - POST /users/{user_id}/mqtt/refresh：排队一个 USER 范围的抓取周期

use crate::AppState;
use crate::utils::response::{mqtt_disabled, mqtt_stopped, ok};
use api_contract::MqttRefreshDto;
use axum::{
    extract::{Path, State},
    response::Response,
};
use domain::UserId;

#[derive(serde::Deserialize)]
pub struct UserPath {
    pub(crate) user_id: UserId,
}

pub async fn refresh_user(State(state): State<AppState>, Path(path): Path<UserPath>) -> Response {
    let Some(publisher) = state.publisher.as_ref() else {
        return mqtt_disabled();
    };
    match publisher.on_userdata_changed(path.user_id).await {
        Ok(()) => ok(MqttRefreshDto {
            user_id: path.user_id,
            queued: true,
        }),
        Err(err) => mqtt_stopped(err.to_string()),
    }
}
