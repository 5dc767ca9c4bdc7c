use super::MessageProvider;
use super::state::{StateField, resolve_state_fields, state_topic};
use crate::error::MqttError;
use crate::homeassistant;
use crate::message::{MqttMessage, bool_payload, user_topic};
use domain::UserId;
use hub_channels::DeviceDirectory;
use hub_storage::ChannelRow;
use tracing::warn;

const CHANNEL_FIELDS: usize = 4;

/// 通道主题 + Home Assistant 发现配置 + 通道状态。
///
/// 下标依次为：`type`、`function`、`caption`、`hidden`，
/// 然后是发现配置，最后是状态字段。
///
/// 发现配置在绑定时按前缀渲染，渲染失败的条目直接跳过，
/// 后续下标顺延，状态字段照常产出。
#[derive(Debug, Clone)]
pub struct ChannelAndStateMessageProvider {
    row: ChannelRow,
    discovery: Vec<MqttMessage>,
    state: Vec<StateField>,
}

impl ChannelAndStateMessageProvider {
    /// 绑定通道行，渲染发现配置，并从目录读取该通道的状态快照。
    pub fn bind(row: ChannelRow, directory: &DeviceDirectory, topic_prefix: &str) -> Self {
        let state = resolve_state_fields(
            directory,
            row.user_id,
            row.device_id,
            row.channel_id,
            Some(row.function()),
        );
        let discovery = render_discovery(&row, topic_prefix, homeassistant::config_at);
        Self {
            row,
            discovery,
            state,
        }
    }

    fn channel_message(&self, index: usize, topic_prefix: &str) -> Option<MqttMessage> {
        let row = &self.row;
        let (name, payload) = match index {
            0 => ("type", row.channel_type().name().to_string()),
            1 => ("function", row.function().name().to_string()),
            2 => ("caption", row.channel_caption.clone().unwrap_or_default()),
            3 => ("hidden", bool_payload(row.channel_hidden).to_string()),
            _ => return None,
        };
        let suffix = format!(
            "devices/{}/channels/{}/{}",
            row.device_id, row.channel_id, name
        );
        Some(MqttMessage::new(
            user_topic(topic_prefix, &row.user_suid, &suffix),
            payload,
        ))
    }
}

fn render_discovery(
    row: &ChannelRow,
    topic_prefix: &str,
    render: impl Fn(&ChannelRow, usize, &str) -> Result<Option<MqttMessage>, MqttError>,
) -> Vec<MqttMessage> {
    let mut configs = Vec::new();
    for index in 0..homeassistant::config_count(row) {
        match render(row, index, topic_prefix) {
            Ok(Some(message)) => configs.push(message),
            Ok(None) => break,
            Err(err) => {
                warn!(
                    target: "hub.mqtt",
                    channel_id = row.channel_id,
                    index,
                    error = %err,
                    "discovery_config_skipped"
                );
            }
        }
    }
    configs
}

impl MessageProvider for ChannelAndStateMessageProvider {
    fn message_at_index(&self, index: usize, topic_prefix: &str) -> Option<MqttMessage> {
        if index < CHANNEL_FIELDS {
            return self.channel_message(index, topic_prefix);
        }

        let index = index - CHANNEL_FIELDS;
        if let Some(config) = self.discovery.get(index) {
            return Some(config.clone());
        }

        let field = self.state.get(index - self.discovery.len())?;
        Some(MqttMessage::new(
            state_topic(
                topic_prefix,
                &self.row.user_suid,
                self.row.device_id,
                self.row.channel_id,
                field,
            ),
            field.payload.clone(),
        ))
    }

    fn owner(&self) -> Option<(UserId, &str)> {
        Some((self.row.user_id, self.row.user_suid.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::collect_messages;
    use domain::{ChannelFunction, ChannelType};
    use hub_channels::NoopDeviceRpc;
    use std::sync::Arc;

    fn row(function: ChannelFunction) -> ChannelRow {
        ChannelRow {
            user_id: 1,
            user_suid: "abc".to_string(),
            device_id: 36,
            channel_id: 50,
            channel_number: 0,
            channel_type: ChannelType::Relay.code(),
            channel_func: function.code(),
            channel_param1: 0,
            channel_param2: 0,
            channel_param3: 0,
            channel_caption: None,
            channel_hidden: false,
        }
    }

    #[test]
    fn light_switch_publishes_channel_discovery_then_state() {
        let directory = DeviceDirectory::new(Arc::new(NoopDeviceRpc));
        directory.register_user(1, "abc");
        let registry = directory.attach_device(1, 36).expect("registry");
        registry.add_channel(50, 0, ChannelType::Relay, ChannelFunction::LightSwitch, 0, 0, 0);

        let provider = ChannelAndStateMessageProvider::bind(
            row(ChannelFunction::LightSwitch),
            &directory,
            "supla",
        );
        let topics: Vec<_> = collect_messages(&provider, "supla")
            .into_iter()
            .map(|message| message.topic)
            .collect();
        assert_eq!(
            topics,
            vec![
                "supla/abc/devices/36/channels/50/type",
                "supla/abc/devices/36/channels/50/function",
                "supla/abc/devices/36/channels/50/caption",
                "supla/abc/devices/36/channels/50/hidden",
                "homeassistant/light/abc/50/config",
                "supla/abc/devices/36/channels/50/state/connected",
                "supla/abc/devices/36/channels/50/state/on",
            ]
        );
    }

    #[test]
    fn function_none_keeps_only_channel_fields() {
        let directory = DeviceDirectory::new(Arc::new(NoopDeviceRpc));
        let provider =
            ChannelAndStateMessageProvider::bind(row(ChannelFunction::None), &directory, "supla");
        let messages = collect_messages(&provider, "supla");
        assert_eq!(messages.len(), CHANNEL_FIELDS);
        assert_eq!(messages[1].payload, "NONE");
    }

    #[test]
    fn failed_discovery_config_is_skipped_without_ending_the_channel() {
        let directory = DeviceDirectory::new(Arc::new(NoopDeviceRpc));
        directory.register_user(1, "abc");
        let registry = directory.attach_device(1, 36).expect("registry");
        registry.add_channel(
            50,
            0,
            ChannelType::Dht22,
            ChannelFunction::HumidityAndTemperature,
            0,
            0,
            0,
        );

        let row = row(ChannelFunction::HumidityAndTemperature);
        let discovery = render_discovery(&row, "supla", |row, index, prefix| {
            if index == 0 {
                Err(MqttError::Payload("unserializable".to_string()))
            } else {
                homeassistant::config_at(row, index, prefix)
            }
        });
        assert_eq!(discovery.len(), 1);
        assert_eq!(discovery[0].topic, "homeassistant/sensor/abc/50_1/config");

        let provider = ChannelAndStateMessageProvider {
            state: resolve_state_fields(&directory, 1, 36, 50, Some(row.function())),
            row,
            discovery,
        };
        let topics: Vec<_> = collect_messages(&provider, "supla")
            .into_iter()
            .map(|message| message.topic)
            .collect();
        assert_eq!(topics.len(), CHANNEL_FIELDS + 1 + provider.state.len());
        assert_eq!(topics[CHANNEL_FIELDS], "homeassistant/sensor/abc/50_1/config");
        assert_eq!(
            topics[CHANNEL_FIELDS + 1],
            "supla/abc/devices/36/channels/50/state/connected"
        );
    }
}
