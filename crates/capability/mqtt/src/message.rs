//! 发布单元：一个主题与其文本负载。

/// 一条待发布的 MQTT 消息。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MqttMessage {
    pub topic: String,
    pub payload: String,
}

impl MqttMessage {
    pub fn new(topic: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }

    /// 只有主题、没有负载（退订过滤器）。
    pub fn topic_only(topic: impl Into<String>) -> Self {
        Self::new(topic, String::new())
    }
}

/// `<prefix>/<suid>/<suffix>`
pub(crate) fn user_topic(prefix: &str, suid: &str, suffix: &str) -> String {
    format!("{}/{}/{}", prefix, suid, suffix)
}

pub(crate) fn bool_payload(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

/// Home Assistant 主题中的用户标识：`[A-Za-z0-9_-]` 以外的字符替换为 `_`。
pub(crate) fn ha_suid(suid: &str) -> String {
    suid.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ha_suid_replaces_characters_outside_topic_alphabet() {
        assert_eq!(ha_suid("48test@supla.org"), "48test_supla_org");
        assert_eq!(ha_suid("a-b_C9"), "a-b_C9");
        assert_eq!(ha_suid("x/y+z#ż"), "x_y_z__");
    }
}
