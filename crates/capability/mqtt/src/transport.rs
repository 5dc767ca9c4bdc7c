//! MQTT 传输协作者。

use crate::error::MqttError;
use crate::message::MqttMessage;
use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

const INBOUND_QUEUE_CAPACITY: usize = 1024;

/// 发布/订阅/退订抽象。
#[async_trait]
pub trait MqttTransport: Send + Sync {
    async fn publish(&self, message: &MqttMessage) -> Result<(), MqttError>;
    async fn subscribe(&self, topic_filter: &str) -> Result<(), MqttError>;
    async fn unsubscribe(&self, topic_filter: &str) -> Result<(), MqttError>;
}

/// 空传输（MQTT 关闭时占位）。
#[derive(Debug, Default)]
pub struct NoopTransport;

#[async_trait]
impl MqttTransport for NoopTransport {
    async fn publish(&self, _message: &MqttMessage) -> Result<(), MqttError> {
        Ok(())
    }

    async fn subscribe(&self, _topic_filter: &str) -> Result<(), MqttError> {
        Ok(())
    }

    async fn unsubscribe(&self, _topic_filter: &str) -> Result<(), MqttError> {
        Ok(())
    }
}

/// rumqttc 传输配置。
#[derive(Debug, Clone)]
pub struct RumqttTransportConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub client_id: String,
    pub qos: u8,
    pub retain: bool,
}

/// 基于 rumqttc `AsyncClient` 的传输。
///
/// 事件循环在独立任务中轮询，出错后等待 1 秒继续（rumqttc 自动重连）。
/// 收到的发布消息转入入站队列；队列满时丢弃并告警，事件循环不阻塞。
/// 空负载消息总以保留方式发布，用于清除代理上的保留消息。
#[derive(Clone)]
pub struct RumqttTransport {
    client: AsyncClient,
    qos: QoS,
    retain: bool,
}

impl RumqttTransport {
    pub fn connect(
        config: RumqttTransportConfig,
    ) -> (Self, mpsc::Receiver<MqttMessage>, tokio::task::JoinHandle<()>) {
        let mut options = MqttOptions::new(config.client_id, config.host, config.port);
        options.set_keep_alive(Duration::from_secs(30));
        if let (Some(username), Some(password)) = (config.username, config.password) {
            options.set_credentials(username, password);
        }
        let (client, mut eventloop) = AsyncClient::new(options, 10);
        let (inbound, receiver) = mpsc::channel(INBOUND_QUEUE_CAPACITY);
        let handle = tokio::spawn(async move {
            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(Packet::Publish(publish))) => {
                        let message = MqttMessage::new(
                            publish.topic,
                            String::from_utf8_lossy(&publish.payload).into_owned(),
                        );
                        forward_inbound(&inbound, message);
                    }
                    Ok(event) => debug!(target: "hub.mqtt", ?event, "mqtt_event"),
                    Err(err) => {
                        warn!(target: "hub.mqtt", error = %err, "mqtt_eventloop_error");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        });
        (
            Self {
                client,
                qos: qos_from_u8(config.qos),
                retain: config.retain,
            },
            receiver,
            handle,
        )
    }
}

fn forward_inbound(inbound: &mpsc::Sender<MqttMessage>, message: MqttMessage) {
    match inbound.try_send(message) {
        Ok(()) => {}
        Err(mpsc::error::TrySendError::Full(message)) => {
            warn!(target: "hub.mqtt", topic = %message.topic, "mqtt_inbound_dropped");
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {}
    }
}

/// 空负载总是保留发布。
fn retain_for(message: &MqttMessage, retain: bool) -> bool {
    retain || message.payload.is_empty()
}

#[async_trait]
impl MqttTransport for RumqttTransport {
    async fn publish(&self, message: &MqttMessage) -> Result<(), MqttError> {
        self.client
            .publish(
                message.topic.as_str(),
                self.qos,
                retain_for(message, self.retain),
                message.payload.clone().into_bytes(),
            )
            .await
            .map_err(|err| MqttError::Transport(err.to_string()))
    }

    async fn subscribe(&self, topic_filter: &str) -> Result<(), MqttError> {
        self.client
            .subscribe(topic_filter, self.qos)
            .await
            .map_err(|err| MqttError::Transport(err.to_string()))
    }

    async fn unsubscribe(&self, topic_filter: &str) -> Result<(), MqttError> {
        self.client
            .unsubscribe(topic_filter)
            .await
            .map_err(|err| MqttError::Transport(err.to_string()))
    }
}

pub(crate) fn qos_from_u8(value: u8) -> QoS {
    match value {
        0 => QoS::AtMostOnce,
        1 => QoS::AtLeastOnce,
        2 => QoS::ExactlyOnce,
        _ => QoS::AtLeastOnce,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_qos_falls_back_to_at_least_once() {
        assert_eq!(qos_from_u8(0), QoS::AtMostOnce);
        assert_eq!(qos_from_u8(2), QoS::ExactlyOnce);
        assert_eq!(qos_from_u8(9), QoS::AtLeastOnce);
    }

    #[test]
    fn empty_payload_is_always_retained() {
        assert!(retain_for(&MqttMessage::topic_only("supla/u1/account/email"), false));
        assert!(!retain_for(&MqttMessage::new("supla/u1/account/email", "a@b.c"), false));
        assert!(retain_for(&MqttMessage::new("supla/u1/account/email", "a@b.c"), true));
    }

    #[tokio::test]
    async fn full_inbound_queue_drops_without_blocking() {
        let (sender, mut receiver) = mpsc::channel(1);
        forward_inbound(&sender, MqttMessage::new("supla/u1/a", "1"));
        forward_inbound(&sender, MqttMessage::new("supla/u1/b", "2"));
        assert_eq!(receiver.recv().await.expect("first").topic, "supla/u1/a");
        assert!(receiver.try_recv().is_err());
    }
}
