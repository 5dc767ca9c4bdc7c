//! 消息提供者
//!
//! 每个提供者绑定一个实体（用户行、设备行、通道行或通道状态），
//! 按下标依次产出 `(topic, payload)`。下标是稠密的：下标 n 有消息，
//! 则 0..n 都有消息；第一个返回 `None` 的下标即为耗尽。
//!
//! 提供者本身无游标；抓取周期为每个阶段持有一个 [`ProviderCursor`]，
//! 重新绑定行时游标归零。

mod channel;
mod device;
mod state;
mod unpublish;
mod user;

pub use channel::ChannelAndStateMessageProvider;
pub use device::DeviceMessageProvider;
pub use state::{StateField, StateMessageProvider, channel_state_fields};
pub use unpublish::UnpublishUserTopicProvider;
pub use user::UserMessageProvider;

use crate::message::MqttMessage;
use domain::UserId;

/// 按下标寻址的消息提供者。
pub trait MessageProvider: Send {
    /// 返回下标 `index` 处的消息，越界返回 `None`。
    fn message_at_index(&self, index: usize, topic_prefix: &str) -> Option<MqttMessage>;

    /// 所绑定实体的归属用户（用于记录本周期启用的用户）。
    fn owner(&self) -> Option<(UserId, &str)> {
        None
    }
}

/// 提供者游标。
#[derive(Debug, Default, Clone, Copy)]
pub struct ProviderCursor {
    index: usize,
}

impl ProviderCursor {
    pub fn reset(&mut self) {
        self.index = 0;
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// 取出当前下标的消息并前进；耗尽时游标不动。
    pub fn next_message<P>(&mut self, provider: &P, topic_prefix: &str) -> Option<MqttMessage>
    where
        P: MessageProvider + ?Sized,
    {
        let message = provider.message_at_index(self.index, topic_prefix)?;
        self.index += 1;
        Some(message)
    }
}

/// 把提供者全部消息收集起来（测试与一次性发布使用）。
pub fn collect_messages<P>(provider: &P, topic_prefix: &str) -> Vec<MqttMessage>
where
    P: MessageProvider + ?Sized,
{
    let mut cursor = ProviderCursor::default();
    std::iter::from_fn(|| cursor.next_message(provider, topic_prefix)).collect()
}
