use super::MessageProvider;
use crate::message::{MqttMessage, ha_suid, user_topic};

/// 用户的两个主题过滤器：自身前缀下全部主题与 Home Assistant 发现配置。
#[derive(Debug, Clone)]
pub struct UnpublishUserTopicProvider {
    user_suid: String,
}

impl UnpublishUserTopicProvider {
    pub fn new(user_suid: impl Into<String>) -> Self {
        Self {
            user_suid: user_suid.into(),
        }
    }
}

impl MessageProvider for UnpublishUserTopicProvider {
    fn message_at_index(&self, index: usize, topic_prefix: &str) -> Option<MqttMessage> {
        match index {
            0 => Some(MqttMessage::topic_only(user_topic(
                topic_prefix,
                &self.user_suid,
                "#",
            ))),
            1 => Some(MqttMessage::topic_only(format!(
                "homeassistant/+/{}/+/config",
                ha_suid(&self.user_suid)
            ))),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::collect_messages;

    #[test]
    fn yields_both_wildcards() {
        let topics: Vec<_> = collect_messages(&UnpublishUserTopicProvider::new("u1"), "supla")
            .into_iter()
            .map(|message| message.topic)
            .collect();
        assert_eq!(topics, vec!["supla/u1/#", "homeassistant/+/u1/+/config"]);
    }

    #[test]
    fn discovery_filter_uses_sanitized_suid() {
        let provider = UnpublishUserTopicProvider::new("48test@supla.org");
        let filter = provider.message_at_index(1, "supla").expect("filter");
        assert_eq!(filter.topic, "homeassistant/+/48test_supla_org/+/config");
        let own = provider.message_at_index(0, "supla").expect("filter");
        assert_eq!(own.topic, "supla/48test@supla.org/#");
    }
}
