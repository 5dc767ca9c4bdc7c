use super::MessageProvider;
use crate::message::{MqttMessage, user_topic};
use domain::UserId;
use hub_storage::UserRow;

/// 账户主题：`account/email`、`account/timezone`。
#[derive(Debug, Clone)]
pub struct UserMessageProvider {
    row: UserRow,
}

impl UserMessageProvider {
    pub fn new(row: UserRow) -> Self {
        Self { row }
    }
}

impl MessageProvider for UserMessageProvider {
    fn message_at_index(&self, index: usize, topic_prefix: &str) -> Option<MqttMessage> {
        let (suffix, payload) = match index {
            0 => ("account/email", self.row.user_email.as_str()),
            1 => ("account/timezone", self.row.user_timezone.as_str()),
            _ => return None,
        };
        Some(MqttMessage::new(
            user_topic(topic_prefix, &self.row.user_suid, suffix),
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
    fn account_topics_are_rooted_at_suid() {
        let provider = UserMessageProvider::new(UserRow {
            user_id: 1,
            user_suid: "abc".to_string(),
            user_email: "a@b.c".to_string(),
            user_timezone: "Europe/Warsaw".to_string(),
        });
        let messages = collect_messages(&provider, "supla");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], MqttMessage::new("supla/abc/account/email", "a@b.c"));
        assert_eq!(messages[1].topic, "supla/abc/account/timezone");
    }
}
