//! 发布驱动
//!
//! `MqttPublisher::run_cycle` 把一个抓取周期抽干到传输层，关闭周期后
//! 根据启用用户集合的变化安排或撤销退订。`spawn_publisher` 把变更通知
//! 转成周期，每个周期在独立任务中运行；`spawn_inbound_listener` 把代理
//! 回送的消息交给退订调度。
//!
//! 设备删除分两步：删除前 `before_device_delete` 记录设备主题快照，
//! 删除后 `on_device_deleted` 对快照中的每个主题发布空的保留消息。

use crate::context::MqttDsContext;
use crate::datasource::PublisherDataSource;
use crate::deletion::DeletedDeviceTopics;
use crate::enabled_users::Transitions;
use crate::error::MqttError;
use crate::message::MqttMessage;
use crate::transport::MqttTransport;
use crate::unpublisher::UnsubscribeScheduler;
use domain::{ChannelId, DeviceId, UserId};
use hub_telemetry::{record_message_published, record_publish_failure};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const EVENT_QUEUE_CAPACITY: usize = 256;

/// 单个周期的执行结果。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// 周期是否通过准入并被打开。
    pub opened: bool,
    pub published: usize,
    pub transitions: Transitions,
}

/// MQTT 发布器。
pub struct MqttPublisher {
    datasource: PublisherDataSource,
    transport: Arc<dyn MqttTransport>,
    scheduler: UnsubscribeScheduler,
    deleted_devices: DeletedDeviceTopics,
}

impl MqttPublisher {
    pub fn new(
        datasource: PublisherDataSource,
        transport: Arc<dyn MqttTransport>,
        unpublish_delay: Duration,
    ) -> Self {
        let scheduler = UnsubscribeScheduler::new(
            transport.clone(),
            datasource.enabled_users().clone(),
            datasource.topic_prefix(),
            unpublish_delay,
        );
        Self {
            datasource,
            transport,
            scheduler,
            deleted_devices: DeletedDeviceTopics::default(),
        }
    }

    pub fn datasource(&self) -> &PublisherDataSource {
        &self.datasource
    }

    pub fn scheduler(&self) -> &UnsubscribeScheduler {
        &self.scheduler
    }

    /// 执行一个周期。发布失败时中止周期（不合并启用用户）并返回错误。
    pub async fn run_cycle(&self, ctx: MqttDsContext) -> Result<CycleReport, MqttError> {
        let Some(mut cycle) = self.datasource.open(ctx) else {
            return Ok(CycleReport::default());
        };

        let mut published = 0;
        while let Some(message) = cycle.next_message().await {
            if let Err(err) = self.transport.publish(&message).await {
                record_publish_failure();
                warn!(
                    target: "hub.mqtt",
                    scope = ctx.scope().as_str(),
                    topic = %message.topic,
                    error = %err,
                    "publish_failed"
                );
                cycle.close();
                return Err(err);
            }
            record_message_published();
            published += 1;
        }

        let transitions = cycle.close();
        self.apply_transitions(&transitions).await;
        Ok(CycleReport {
            opened: true,
            published,
            transitions,
        })
    }

    async fn apply_transitions(&self, transitions: &Transitions) {
        for user in &transitions.disabled {
            self.scheduler.schedule(user).await;
        }
        for user in &transitions.enabled {
            self.scheduler.cancel(user.user_id).await;
        }
    }

    /// 代理回送的消息。
    pub async fn on_message_received(&self, message: &MqttMessage) -> bool {
        self.scheduler.on_message_received(message).await
    }

    fn accepts_device_cleanup(&self, user_id: UserId) -> bool {
        self.datasource.enabled_users().contains(user_id) && !self.scheduler.is_pending(user_id)
    }

    /// 设备删除前记录其主题快照。返回快照中的主题数。
    ///
    /// 用户未启用或正在退订时不记录。
    pub async fn before_device_delete(&self, user_id: UserId, device_id: DeviceId) -> usize {
        if !self.accepts_device_cleanup(user_id) {
            debug!(target: "hub.mqtt", user_id, device_id, "device_snapshot_skipped");
            return 0;
        }
        let topics = self.datasource.device_topics(user_id, device_id).await;
        let count = topics.len();
        if count > 0 {
            self.deleted_devices.remember(user_id, device_id, topics);
        }
        debug!(target: "hub.mqtt", user_id, device_id, topics = count, "device_snapshot_taken");
        count
    }

    /// 设备删除后清除快照中的全部主题。返回清除的主题数。
    ///
    /// 快照缺失或过期、用户已禁用或正在退订时什么都不发。
    pub async fn on_device_deleted(
        &self,
        user_id: UserId,
        device_id: DeviceId,
    ) -> Result<usize, MqttError> {
        let Some(topics) = self.deleted_devices.take(user_id, device_id) else {
            debug!(target: "hub.mqtt", user_id, device_id, "device_snapshot_missing");
            return Ok(0);
        };
        if !self.accepts_device_cleanup(user_id) {
            debug!(target: "hub.mqtt", user_id, device_id, "device_cleanup_skipped");
            return Ok(0);
        }

        for topic in &topics {
            if let Err(err) = self.transport.publish(&MqttMessage::topic_only(topic.as_str())).await {
                record_publish_failure();
                warn!(
                    target: "hub.mqtt",
                    user_id,
                    device_id,
                    topic = %topic,
                    error = %err,
                    "device_cleanup_failed"
                );
                return Err(err);
            }
            record_message_published();
        }
        info!(
            target: "hub.mqtt",
            user_id,
            device_id,
            cleared = topics.len(),
            "device_topics_cleared"
        );
        Ok(topics.len())
    }
}

/// 发布器事件。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublisherEvent {
    FullResync,
    UserDataChanged {
        user_id: UserId,
    },
    DeviceChanged {
        user_id: UserId,
        device_id: DeviceId,
    },
    ChannelStateChanged {
        user_id: UserId,
        device_id: DeviceId,
        channel_id: ChannelId,
    },
    DeviceDeleted {
        user_id: UserId,
        device_id: DeviceId,
    },
    Shutdown,
}

impl PublisherEvent {
    fn context(self) -> Option<MqttDsContext> {
        let ctx = match self {
            Self::FullResync => MqttDsContext::Full,
            Self::UserDataChanged { user_id } => MqttDsContext::User { user_id },
            Self::DeviceChanged { user_id, device_id } => {
                MqttDsContext::Device { user_id, device_id }
            }
            Self::ChannelStateChanged {
                user_id,
                device_id,
                channel_id,
            } => MqttDsContext::ChannelState {
                user_id,
                device_id,
                channel_id,
            },
            Self::DeviceDeleted { .. } | Self::Shutdown => return None,
        };
        Some(ctx)
    }
}

/// 发布器句柄（变更通知入口）。
#[derive(Clone)]
pub struct PublisherHandle {
    sender: mpsc::Sender<PublisherEvent>,
    publisher: Arc<MqttPublisher>,
}

impl PublisherHandle {
    pub async fn full_resync(&self) -> Result<(), MqttError> {
        self.send(PublisherEvent::FullResync).await
    }

    pub async fn on_userdata_changed(&self, user_id: UserId) -> Result<(), MqttError> {
        self.send(PublisherEvent::UserDataChanged { user_id }).await
    }

    pub async fn on_device_changed(
        &self,
        user_id: UserId,
        device_id: DeviceId,
    ) -> Result<(), MqttError> {
        self.send(PublisherEvent::DeviceChanged { user_id, device_id })
            .await
    }

    pub async fn on_channel_state_changed(
        &self,
        user_id: UserId,
        device_id: DeviceId,
        channel_id: ChannelId,
    ) -> Result<(), MqttError> {
        self.send(PublisherEvent::ChannelStateChanged {
            user_id,
            device_id,
            channel_id,
        })
        .await
    }

    /// 在删除设备之前调用：就地记录主题快照，返回后即可删除。
    pub async fn before_device_delete(
        &self,
        user_id: UserId,
        device_id: DeviceId,
    ) -> Result<usize, MqttError> {
        if self.sender.is_closed() {
            return Err(MqttError::Stopped);
        }
        Ok(self.publisher.before_device_delete(user_id, device_id).await)
    }

    pub async fn on_device_deleted(
        &self,
        user_id: UserId,
        device_id: DeviceId,
    ) -> Result<(), MqttError> {
        self.send(PublisherEvent::DeviceDeleted { user_id, device_id })
            .await
    }

    pub async fn shutdown(&self) -> Result<(), MqttError> {
        self.send(PublisherEvent::Shutdown).await
    }

    async fn send(&self, event: PublisherEvent) -> Result<(), MqttError> {
        self.sender
            .send(event)
            .await
            .map_err(|_| MqttError::Stopped)
    }
}

/// 启动发布器事件循环。
///
/// 给定全量同步间隔时，启动后立即执行一次 FULL 周期，之后按间隔重复。
pub fn spawn_publisher(
    publisher: Arc<MqttPublisher>,
    full_resync_interval: Option<Duration>,
) -> (PublisherHandle, JoinHandle<()>) {
    let (sender, mut receiver) = mpsc::channel(EVENT_QUEUE_CAPACITY);
    let handle = PublisherHandle {
        sender,
        publisher: publisher.clone(),
    };
    let task = tokio::spawn(async move {
        let mut resync = full_resync_interval.map(tokio::time::interval);
        loop {
            let event = match resync.as_mut() {
                Some(interval) => tokio::select! {
                    _ = interval.tick() => Some(PublisherEvent::FullResync),
                    event = receiver.recv() => event,
                },
                None => receiver.recv().await,
            };
            let event = match event {
                None | Some(PublisherEvent::Shutdown) => break,
                Some(event) => event,
            };

            let publisher = publisher.clone();
            if let PublisherEvent::DeviceDeleted { user_id, device_id } = event {
                tokio::spawn(async move {
                    if let Err(err) = publisher.on_device_deleted(user_id, device_id).await {
                        warn!(
                            target: "hub.mqtt",
                            user_id,
                            device_id,
                            error = %err,
                            "device_cleanup_aborted"
                        );
                    }
                });
                continue;
            }
            let Some(ctx) = event.context() else {
                continue;
            };
            tokio::spawn(async move {
                if let Err(err) = publisher.run_cycle(ctx).await {
                    warn!(
                        target: "hub.mqtt",
                        scope = ctx.scope().as_str(),
                        user_id = ?ctx.user_id(),
                        error = %err,
                        "fetch_cycle_aborted"
                    );
                }
            });
        }

        let cancelled = publisher.scheduler().cancel_all();
        info!(target: "hub.mqtt", pending_cancelled = cancelled, "publisher_stopped");
    });
    (handle, task)
}

/// 把传输层的入站消息交给发布器，直到入站队列关闭。
pub fn spawn_inbound_listener(
    publisher: Arc<MqttPublisher>,
    mut inbound: mpsc::Receiver<MqttMessage>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(message) = inbound.recv().await {
            publisher.on_message_received(&message).await;
        }
        debug!(target: "hub.mqtt", "inbound_listener_stopped");
    })
}
