//! 抓取周期上下文：范围与目标 id。

use domain::{ChannelId, DeviceId, UserId};

/// 抓取范围。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Full,
    User,
    Device,
    ChannelState,
}

/// 抓取阶段。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    User,
    Device,
    Channel,
    State,
}

impl Scope {
    /// 该范围依次进入的阶段。
    pub fn stages(self) -> &'static [Stage] {
        match self {
            Self::Full | Self::User => &[Stage::User, Stage::Device, Stage::Channel],
            Self::Device => &[Stage::Device, Stage::Channel],
            Self::ChannelState => &[Stage::State],
        }
    }

    /// 是否需要目标用户已启用才允许打开。
    pub fn requires_enabled_user(self) -> bool {
        matches!(self, Self::Device | Self::ChannelState)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::User => "user",
            Self::Device => "device",
            Self::ChannelState => "channel_state",
        }
    }
}

/// 一次抓取周期的描述。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MqttDsContext {
    Full,
    User {
        user_id: UserId,
    },
    Device {
        user_id: UserId,
        device_id: DeviceId,
    },
    ChannelState {
        user_id: UserId,
        device_id: DeviceId,
        channel_id: ChannelId,
    },
}

impl MqttDsContext {
    pub fn scope(&self) -> Scope {
        match self {
            Self::Full => Scope::Full,
            Self::User { .. } => Scope::User,
            Self::Device { .. } => Scope::Device,
            Self::ChannelState { .. } => Scope::ChannelState,
        }
    }

    pub fn user_id(&self) -> Option<UserId> {
        match *self {
            Self::Full => None,
            Self::User { user_id }
            | Self::Device { user_id, .. }
            | Self::ChannelState { user_id, .. } => Some(user_id),
        }
    }

    pub fn device_id(&self) -> Option<DeviceId> {
        match *self {
            Self::Device { device_id, .. } | Self::ChannelState { device_id, .. } => {
                Some(device_id)
            }
            _ => None,
        }
    }

    pub fn channel_id(&self) -> Option<ChannelId> {
        match *self {
            Self::ChannelState { channel_id, .. } => Some(channel_id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_device_and_state_scopes_are_gated() {
        assert!(!Scope::Full.requires_enabled_user());
        assert!(!Scope::User.requires_enabled_user());
        assert!(Scope::Device.requires_enabled_user());
        assert!(Scope::ChannelState.requires_enabled_user());
    }

    #[test]
    fn user_scope_walks_the_same_stages_as_full() {
        assert_eq!(Scope::User.stages(), Scope::Full.stages());
        assert_eq!(Scope::User.stages()[0], Stage::User);
        assert_eq!(Scope::Device.stages(), &[Stage::Device, Stage::Channel]);
        assert_eq!(Scope::ChannelState.stages(), &[Stage::State]);
    }

    #[test]
    fn ids_follow_variant() {
        let ctx = MqttDsContext::ChannelState {
            user_id: 1,
            device_id: 2,
            channel_id: 3,
        };
        assert_eq!((ctx.user_id(), ctx.device_id(), ctx.channel_id()), (Some(1), Some(2), Some(3)));
        assert_eq!(MqttDsContext::Full.user_id(), None);
    }
}
