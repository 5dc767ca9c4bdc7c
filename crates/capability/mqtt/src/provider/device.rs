use super::MessageProvider;
use crate::message::{MqttMessage, bool_payload, user_topic};
use domain::UserId;
use hub_storage::DeviceRow;

/// 设备主题，位于 `devices/<deviceId>/` 下。
#[derive(Debug, Clone)]
pub struct DeviceMessageProvider {
    row: DeviceRow,
}

impl DeviceMessageProvider {
    pub fn new(row: DeviceRow) -> Self {
        Self { row }
    }

    fn field(&self, index: usize) -> Option<(&'static str, String)> {
        let row = &self.row;
        let field = match index {
            0 => ("enabled", bool_payload(row.device_enabled).to_string()),
            1 => (
                "last_connected",
                row.device_last_connected_at_ms
                    .map(|ms| ms.to_string())
                    .unwrap_or_default(),
            ),
            2 => ("last_ipv4", row.device_last_ipv4.clone().unwrap_or_default()),
            3 => ("manufacturer", row.device_mfr_id.to_string()),
            4 => ("name", row.device_name.clone()),
            5 => ("proto_ver", row.device_proto_version.to_string()),
            6 => ("soft_ver", row.device_soft_ver.clone()),
            _ => return None,
        };
        Some(field)
    }
}

impl MessageProvider for DeviceMessageProvider {
    fn message_at_index(&self, index: usize, topic_prefix: &str) -> Option<MqttMessage> {
        let (name, payload) = self.field(index)?;
        let suffix = format!("devices/{}/{}", self.row.device_id, name);
        Some(MqttMessage::new(
            user_topic(topic_prefix, &self.row.user_suid, &suffix),
            payload,
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

    #[test]
    fn never_connected_device_has_empty_timestamp() {
        let provider = DeviceMessageProvider::new(DeviceRow {
            user_id: 1,
            user_suid: "abc".to_string(),
            device_id: 7,
            device_enabled: true,
            device_last_connected_at_ms: None,
            device_last_ipv4: None,
            device_mfr_id: 4,
            device_name: "ZAMEL".to_string(),
            device_proto_version: 10,
            device_soft_ver: "2.7.0".to_string(),
        });
        let messages = collect_messages(&provider, "supla");
        assert_eq!(messages.len(), 7);
        assert_eq!(messages[0], MqttMessage::new("supla/abc/devices/7/enabled", "true"));
        assert_eq!(messages[1].payload, "");
        assert_eq!(messages[4].payload, "ZAMEL");
    }
}
