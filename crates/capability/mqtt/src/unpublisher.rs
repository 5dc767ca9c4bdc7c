//! 退订调度
//!
//! 用户被禁用时立即订阅其两个主题过滤器，代理回送的每条保留消息都以
//! 空负载覆盖（清除）；宽限期结束后退订。宽限期内重新启用则撤销任务并
//! 立即退订。
//!
//! 每个用户至多一个待执行任务。到期任务与 `cancel` 通过同一把锁竞争
//! 待执行表项，取走表项的一方胜出，另一方什么都不做。
//! 安排、清除与到期时都会重新检查启用用户集合，已重新启用的用户
//! 不会被清除任何主题。

use crate::enabled_users::{EnabledUserSet, UserRef};
use crate::message::{MqttMessage, ha_suid};
use crate::provider::{UnpublishUserTopicProvider, collect_messages};
use crate::transport::MqttTransport;
use domain::UserId;
use hub_telemetry::{
    record_unsubscribe_cancelled, record_unsubscribe_executed, record_unsubscribe_scheduled,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

struct PendingUnsubscribe {
    generation: u64,
    suid: String,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct PendingTable {
    next_generation: u64,
    entries: HashMap<UserId, PendingUnsubscribe>,
}

type SharedTable = Arc<Mutex<PendingTable>>;

fn lock(table: &SharedTable) -> MutexGuard<'_, PendingTable> {
    table.lock().unwrap_or_else(PoisonError::into_inner)
}

/// 按用户 id 管理的订阅清除与延迟退订。
pub struct UnsubscribeScheduler {
    transport: Arc<dyn MqttTransport>,
    enabled_users: Arc<EnabledUserSet>,
    topic_prefix: String,
    delay: Duration,
    pending: SharedTable,
}

impl UnsubscribeScheduler {
    pub fn new(
        transport: Arc<dyn MqttTransport>,
        enabled_users: Arc<EnabledUserSet>,
        topic_prefix: impl Into<String>,
        delay: Duration,
    ) -> Self {
        Self {
            transport,
            enabled_users,
            topic_prefix: topic_prefix.into(),
            delay,
            pending: Arc::new(Mutex::new(PendingTable::default())),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// 订阅用户的两个过滤器并安排延迟退订；该用户已有待执行任务时替换之。
    ///
    /// 用户此时仍在启用集合中则什么都不做。必须在 tokio 运行时内调用。
    pub async fn schedule(&self, user: &UserRef) {
        if self.enabled_users.contains(user.user_id) {
            debug!(target: "hub.mqtt", user_id = user.user_id, "unsubscribe_schedule_skipped");
            return;
        }

        {
            let mut table = lock(&self.pending);
            table.next_generation += 1;
            let generation = table.next_generation;

            let handle = tokio::spawn(run_unsubscribe(
                self.pending.clone(),
                self.transport.clone(),
                self.enabled_users.clone(),
                self.topic_prefix.clone(),
                self.delay,
                user.clone(),
                generation,
            ));
            let entry = PendingUnsubscribe {
                generation,
                suid: user.suid.clone(),
                handle,
            };
            if let Some(previous) = table.entries.insert(user.user_id, entry) {
                previous.handle.abort();
            }
        }
        record_unsubscribe_scheduled();
        info!(
            target: "hub.mqtt",
            user_id = user.user_id,
            delay_ms = self.delay.as_millis() as u64,
            "unsubscribe_scheduled"
        );

        for filter in user_filters(&self.topic_prefix, &user.suid) {
            if let Err(err) = self.transport.subscribe(&filter).await {
                warn!(
                    target: "hub.mqtt",
                    user_id = user.user_id,
                    topic = %filter,
                    error = %err,
                    "subscribe_failed"
                );
            }
        }
    }

    /// 撤销待执行的退订并立即退订两个过滤器。返回是否确实撤销了一个任务。
    pub async fn cancel(&self, user_id: UserId) -> bool {
        let removed = lock(&self.pending).entries.remove(&user_id);
        let Some(entry) = removed else {
            return false;
        };
        entry.handle.abort();
        record_unsubscribe_cancelled();
        info!(target: "hub.mqtt", user_id, "unsubscribe_cancelled");
        unsubscribe_filters(
            self.transport.as_ref(),
            &self.topic_prefix,
            user_id,
            &entry.suid,
        )
        .await;
        true
    }

    /// 处理代理回送的消息：属于待退订用户的非空消息以空负载覆盖。
    ///
    /// 返回是否发出了清除消息。
    pub async fn on_message_received(&self, message: &MqttMessage) -> bool {
        if message.payload.is_empty() {
            return false;
        }
        let owner = lock(&self.pending)
            .entries
            .iter()
            .find(|(_, entry)| topic_belongs_to(&self.topic_prefix, &entry.suid, &message.topic))
            .map(|(user_id, _)| *user_id);
        let Some(user_id) = owner else {
            return false;
        };
        if self.enabled_users.contains(user_id) {
            debug!(
                target: "hub.mqtt",
                user_id,
                topic = %message.topic,
                "retained_clear_skipped"
            );
            return false;
        }

        match self
            .transport
            .publish(&MqttMessage::topic_only(message.topic.as_str()))
            .await
        {
            Ok(()) => {
                debug!(target: "hub.mqtt", user_id, topic = %message.topic, "retained_cleared");
                true
            }
            Err(err) => {
                warn!(
                    target: "hub.mqtt",
                    user_id,
                    topic = %message.topic,
                    error = %err,
                    "retained_clear_failed"
                );
                false
            }
        }
    }

    pub fn is_pending(&self, user_id: UserId) -> bool {
        lock(&self.pending).entries.contains_key(&user_id)
    }

    pub fn pending_count(&self) -> usize {
        lock(&self.pending).entries.len()
    }

    /// 撤销全部待执行任务（关闭时使用），不发出退订。
    pub fn cancel_all(&self) -> usize {
        let entries: Vec<_> = lock(&self.pending).entries.drain().collect();
        for (_, entry) in &entries {
            entry.handle.abort();
        }
        entries.len()
    }
}

fn user_filters(topic_prefix: &str, suid: &str) -> Vec<String> {
    collect_messages(&UnpublishUserTopicProvider::new(suid), topic_prefix)
        .into_iter()
        .map(|filter| filter.topic)
        .collect()
}

/// `<prefix>/<suid>/...` 或 `homeassistant/<component>/<haSuid>/<objectId>/config`。
fn topic_belongs_to(topic_prefix: &str, suid: &str, topic: &str) -> bool {
    let own = topic
        .strip_prefix(topic_prefix)
        .and_then(|rest| rest.strip_prefix('/'))
        .and_then(|rest| rest.strip_prefix(suid))
        .is_some_and(|rest| rest.len() > 1 && rest.starts_with('/'));
    if own {
        return true;
    }

    let parts: Vec<&str> = topic.split('/').collect();
    matches!(
        parts.as_slice(),
        ["homeassistant", component, node, object, "config"]
            if !component.is_empty() && !object.is_empty() && *node == ha_suid(suid)
    )
}

async fn unsubscribe_filters(
    transport: &dyn MqttTransport,
    topic_prefix: &str,
    user_id: UserId,
    suid: &str,
) {
    for filter in user_filters(topic_prefix, suid) {
        if let Err(err) = transport.unsubscribe(&filter).await {
            warn!(
                target: "hub.mqtt",
                user_id,
                topic = %filter,
                error = %err,
                "unsubscribe_failed"
            );
        }
    }
}

async fn run_unsubscribe(
    pending: SharedTable,
    transport: Arc<dyn MqttTransport>,
    enabled_users: Arc<EnabledUserSet>,
    topic_prefix: String,
    delay: Duration,
    user: UserRef,
    generation: u64,
) {
    tokio::time::sleep(delay).await;

    {
        let mut table = lock(&pending);
        let still_ours = table
            .entries
            .get(&user.user_id)
            .is_some_and(|entry| entry.generation == generation);
        if !still_ours {
            return;
        }
        table.entries.remove(&user.user_id);
    }

    unsubscribe_filters(transport.as_ref(), &topic_prefix, user.user_id, &user.suid).await;

    // 期间被重新启用但未经撤销：按撤销计数
    if enabled_users.contains(user.user_id) {
        record_unsubscribe_cancelled();
        info!(target: "hub.mqtt", user_id = user.user_id, "unsubscribe_superseded");
        return;
    }
    record_unsubscribe_executed();
    info!(target: "hub.mqtt", user_id = user.user_id, "unsubscribe_executed");
}
