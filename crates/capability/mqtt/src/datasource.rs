//! 发布数据源与抓取周期
//!
//! 一个周期按范围依次经过 user → device → channel（或单独的 state）阶段。
//! 每个阶段：
//! 1. 首次进入时打开该种类的行查询；
//! 2. 取到第一行时绑定对应的消息提供者；
//! 3. 逐条取出提供者的消息交给调用方；
//! 4. 提供者耗尽后取下一行重新绑定，行耗尽后关闭该阶段进入下一阶段。
//!
//! 打开查询失败与行耗尽按同样方式处理：该阶段直接结束。

use crate::context::{MqttDsContext, Stage};
use crate::enabled_users::{EnabledUserSet, Transitions, UserAccumulator};
use crate::message::MqttMessage;
use crate::provider::{
    ChannelAndStateMessageProvider, DeviceMessageProvider, MessageProvider, ProviderCursor,
    StateMessageProvider, UserMessageProvider, collect_messages,
};
use domain::{DeviceId, UserId};
use hub_channels::DeviceDirectory;
use hub_storage::{ChannelRow, DeviceRow, MqttDataStore, RowQuery, StorageError, UserRow};
use hub_telemetry::{record_cycle_latency_ms, record_cycle_opened, record_cycle_rejected};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// 按范围打开抓取周期的数据源。
pub struct PublisherDataSource {
    store: Arc<dyn MqttDataStore>,
    directory: Arc<DeviceDirectory>,
    enabled_users: Arc<EnabledUserSet>,
    topic_prefix: String,
}

impl PublisherDataSource {
    pub fn new(
        store: Arc<dyn MqttDataStore>,
        directory: Arc<DeviceDirectory>,
        enabled_users: Arc<EnabledUserSet>,
        topic_prefix: impl Into<String>,
    ) -> Self {
        Self {
            store,
            directory,
            enabled_users,
            topic_prefix: topic_prefix.into(),
        }
    }

    pub fn topic_prefix(&self) -> &str {
        &self.topic_prefix
    }

    pub fn enabled_users(&self) -> &Arc<EnabledUserSet> {
        &self.enabled_users
    }

    /// DEVICE / CHANNEL_STATE 周期要求目标用户已启用；FULL / USER 总是允许。
    pub fn is_context_allowed(&self, ctx: &MqttDsContext) -> bool {
        if !ctx.scope().requires_enabled_user() {
            return true;
        }
        ctx.user_id()
            .is_some_and(|user_id| self.enabled_users.contains(user_id))
    }

    /// 设备当前发布的全部主题：设备字段、通道字段、发现配置与通道状态。
    ///
    /// 用户未启用 MQTT 或查询失败时为空。
    pub async fn device_topics(&self, user_id: UserId, device_id: DeviceId) -> Vec<String> {
        let mut topics = Vec::new();
        match self
            .store
            .open_device_query(Some(user_id), Some(device_id))
            .await
        {
            Ok(mut query) => {
                while let Some(row) = query.fetch_row() {
                    let provider = DeviceMessageProvider::new(row);
                    topics.extend(
                        collect_messages(&provider, &self.topic_prefix)
                            .into_iter()
                            .map(|message| message.topic),
                    );
                }
                query.close();
            }
            Err(err) => {
                warn!(target: "hub.mqtt", user_id, device_id, error = %err, "device_topics_failed");
                return topics;
            }
        }

        match self
            .store
            .open_channel_query(Some(user_id), Some(device_id), None)
            .await
        {
            Ok(mut query) => {
                while let Some(row) = query.fetch_row() {
                    let provider = ChannelAndStateMessageProvider::bind(
                        row,
                        &self.directory,
                        &self.topic_prefix,
                    );
                    topics.extend(
                        collect_messages(&provider, &self.topic_prefix)
                            .into_iter()
                            .map(|message| message.topic),
                    );
                }
                query.close();
            }
            Err(err) => {
                warn!(target: "hub.mqtt", user_id, device_id, error = %err, "device_topics_failed");
            }
        }
        topics
    }

    /// 打开周期；不允许时返回 `None`。
    pub fn open(&self, ctx: MqttDsContext) -> Option<FetchCycle> {
        if !self.is_context_allowed(&ctx) {
            record_cycle_rejected();
            debug!(
                target: "hub.mqtt",
                scope = ctx.scope().as_str(),
                user_id = ?ctx.user_id(),
                "fetch_cycle_rejected"
            );
            return None;
        }

        record_cycle_opened();
        debug!(
            target: "hub.mqtt",
            scope = ctx.scope().as_str(),
            user_id = ?ctx.user_id(),
            device_id = ?ctx.device_id(),
            channel_id = ?ctx.channel_id(),
            "fetch_cycle_opened"
        );
        Some(FetchCycle {
            ctx,
            store: self.store.clone(),
            directory: self.directory.clone(),
            enabled_users: self.enabled_users.clone(),
            topic_prefix: self.topic_prefix.clone(),
            stage_index: 0,
            users: RowStage::new("user"),
            devices: RowStage::new("device"),
            channels: RowStage::new("channel"),
            state: None,
            state_cursor: ProviderCursor::default(),
            accumulator: UserAccumulator::new(ctx.scope()),
            emitted: 0,
            started_at: Instant::now(),
            closed: false,
        })
    }
}

/// 单个阶段：行查询 + 当前绑定的提供者 + 游标。
struct RowStage<R, P> {
    kind: &'static str,
    opened: bool,
    query: Option<RowQuery<R>>,
    provider: Option<P>,
    cursor: ProviderCursor,
}

impl<R, P: MessageProvider> RowStage<R, P> {
    fn new(kind: &'static str) -> Self {
        Self {
            kind,
            opened: false,
            query: None,
            provider: None,
            cursor: ProviderCursor::default(),
        }
    }

    fn open_with(&mut self, result: Result<RowQuery<R>, StorageError>) {
        self.opened = true;
        match result {
            Ok(query) => self.query = Some(query),
            Err(err) => {
                warn!(
                    target: "hub.mqtt",
                    row_kind = self.kind,
                    error = %err,
                    "row_query_open_failed"
                );
            }
        }
    }

    fn next_message(
        &mut self,
        topic_prefix: &str,
        accumulator: &mut UserAccumulator,
        mut bind: impl FnMut(R) -> P,
    ) -> Option<MqttMessage> {
        loop {
            let cursor = &mut self.cursor;
            let message = self.provider.as_ref().and_then(|provider| {
                let message = cursor.next_message(provider, topic_prefix)?;
                if let Some((user_id, suid)) = provider.owner() {
                    accumulator.record(user_id, suid);
                }
                Some(message)
            });
            if message.is_some() {
                return message;
            }
            let row = self.query.as_mut()?.fetch_row()?;
            self.provider = Some(bind(row));
            self.cursor.reset();
        }
    }

    fn close(&mut self) {
        if let Some(query) = self.query.as_mut() {
            query.close();
        }
        self.query = None;
        self.provider = None;
    }
}

/// 一次抓取周期。
///
/// 调用方反复 `next_message()` 直到返回 `None`，然后 `close()`。
/// 未显式关闭的周期在 drop 时关闭；关闭只执行一次。
/// 未抽干就关闭（中止）的周期释放资源，但不合并启用用户集合。
pub struct FetchCycle {
    ctx: MqttDsContext,
    store: Arc<dyn MqttDataStore>,
    directory: Arc<DeviceDirectory>,
    enabled_users: Arc<EnabledUserSet>,
    topic_prefix: String,
    stage_index: usize,
    users: RowStage<UserRow, UserMessageProvider>,
    devices: RowStage<DeviceRow, DeviceMessageProvider>,
    channels: RowStage<ChannelRow, ChannelAndStateMessageProvider>,
    state: Option<StateMessageProvider>,
    state_cursor: ProviderCursor,
    accumulator: UserAccumulator,
    emitted: usize,
    started_at: Instant,
    closed: bool,
}

impl FetchCycle {
    pub fn context(&self) -> &MqttDsContext {
        &self.ctx
    }

    /// 已产出的消息数。
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// 所有阶段是否都已走完。
    pub fn is_drained(&self) -> bool {
        self.stage_index >= self.ctx.scope().stages().len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// 取下一条消息；周期走完或已关闭返回 `None`。
    pub async fn next_message(&mut self) -> Option<MqttMessage> {
        if self.closed {
            return None;
        }
        while let Some(stage) = self.ctx.scope().stages().get(self.stage_index).copied() {
            let message = match stage {
                Stage::User => self.next_user_message().await,
                Stage::Device => self.next_device_message().await,
                Stage::Channel => self.next_channel_message().await,
                Stage::State => self.next_state_message(),
            };
            if let Some(message) = message {
                self.emitted += 1;
                return Some(message);
            }
            self.close_stage(stage);
            self.stage_index += 1;
        }
        None
    }

    async fn next_user_message(&mut self) -> Option<MqttMessage> {
        if !self.users.opened {
            let result = self.store.open_user_query(self.ctx.user_id()).await;
            self.users.open_with(result);
        }
        self.users.next_message(
            &self.topic_prefix,
            &mut self.accumulator,
            UserMessageProvider::new,
        )
    }

    async fn next_device_message(&mut self) -> Option<MqttMessage> {
        if !self.devices.opened {
            let result = self
                .store
                .open_device_query(self.ctx.user_id(), self.ctx.device_id())
                .await;
            self.devices.open_with(result);
        }
        self.devices.next_message(
            &self.topic_prefix,
            &mut self.accumulator,
            DeviceMessageProvider::new,
        )
    }

    async fn next_channel_message(&mut self) -> Option<MqttMessage> {
        if !self.channels.opened {
            let result = self
                .store
                .open_channel_query(self.ctx.user_id(), self.ctx.device_id(), self.ctx.channel_id())
                .await;
            self.channels.open_with(result);
        }
        let directory = &self.directory;
        let topic_prefix = self.topic_prefix.as_str();
        self.channels.next_message(
            topic_prefix,
            &mut self.accumulator,
            |row| ChannelAndStateMessageProvider::bind(row, directory, topic_prefix),
        )
    }

    fn next_state_message(&mut self) -> Option<MqttMessage> {
        let MqttDsContext::ChannelState {
            user_id,
            device_id,
            channel_id,
        } = self.ctx
        else {
            return None;
        };
        if self.state.is_none() {
            self.state = Some(StateMessageProvider::resolve(
                &self.directory,
                user_id,
                device_id,
                channel_id,
            ));
            self.state_cursor.reset();
        }
        let provider = self.state.as_ref()?;
        let message = self.state_cursor.next_message(provider, &self.topic_prefix)?;
        if let Some((user_id, suid)) = provider.owner() {
            self.accumulator.record(user_id, suid);
        }
        Some(message)
    }

    fn close_stage(&mut self, stage: Stage) {
        match stage {
            Stage::User => self.users.close(),
            Stage::Device => self.devices.close(),
            Stage::Channel => self.channels.close(),
            Stage::State => self.state = None,
        }
    }

    /// 关闭周期，返回启用用户集合的变化。
    pub fn close(mut self) -> Transitions {
        self.finish()
    }

    fn finish(&mut self) -> Transitions {
        if self.closed {
            return Transitions::default();
        }
        self.closed = true;
        self.users.close();
        self.devices.close();
        self.channels.close();
        self.state = None;

        let scope = self.ctx.scope();
        let drained = self.is_drained();
        let accumulator = std::mem::replace(&mut self.accumulator, UserAccumulator::new(scope));
        let transitions = if drained {
            self.enabled_users
                .apply(scope, self.ctx.user_id(), accumulator)
        } else {
            Transitions::default()
        };

        let latency_ms = self.started_at.elapsed().as_millis() as u64;
        record_cycle_latency_ms(latency_ms);
        info!(
            target: "hub.mqtt",
            scope = scope.as_str(),
            user_id = ?self.ctx.user_id(),
            emitted = self.emitted,
            drained,
            newly_enabled = transitions.enabled.len(),
            newly_disabled = transitions.disabled.len(),
            latency_ms,
            "fetch_cycle_closed"
        );
        transitions
    }
}

impl Drop for FetchCycle {
    fn drop(&mut self) {
        self.finish();
    }
}
