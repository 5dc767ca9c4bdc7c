/// MQTT 发布链路错误。
#[derive(Debug, thiserror::Error)]
pub enum MqttError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("payload error: {0}")]
    Payload(String),
    #[error("publisher stopped")]
    Stopped,
}
