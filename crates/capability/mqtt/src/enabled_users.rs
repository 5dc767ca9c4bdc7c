//! 启用 MQTT 的用户集合
//!
//! 进程级共享状态，仅在 FULL / USER 周期关闭时整体更新；
//! 每个周期打开时读取它做准入判断。

use crate::context::Scope;
use domain::UserId;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// 启用状态发生变化的用户。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRef {
    pub user_id: UserId,
    pub suid: String,
}

/// 一次周期关闭带来的集合变化。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transitions {
    pub enabled: Vec<UserRef>,
    pub disabled: Vec<UserRef>,
}

impl Transitions {
    pub fn is_empty(&self) -> bool {
        self.enabled.is_empty() && self.disabled.is_empty()
    }
}

/// 周期内累积的已启用用户。
///
/// FULL 记录所有出现过的用户；USER 只记录第一个；其余范围不记录。
#[derive(Debug, Clone)]
pub struct UserAccumulator {
    scope: Scope,
    users: BTreeMap<UserId, String>,
}

impl UserAccumulator {
    pub fn new(scope: Scope) -> Self {
        Self {
            scope,
            users: BTreeMap::new(),
        }
    }

    pub fn record(&mut self, user_id: UserId, suid: &str) {
        match self.scope {
            Scope::Full => {
                self.users
                    .entry(user_id)
                    .or_insert_with(|| suid.to_string());
            }
            Scope::User if self.users.is_empty() => {
                self.users.insert(user_id, suid.to_string());
            }
            _ => {}
        }
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }
}

/// 启用 MQTT 的用户集合（id → suid）。
#[derive(Debug, Default)]
pub struct EnabledUserSet {
    users: Mutex<BTreeMap<UserId, String>>,
}

impl EnabledUserSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<UserId, String>> {
        self.users.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn contains(&self, user_id: UserId) -> bool {
        self.lock().contains_key(&user_id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// 当前集合中的用户 id（升序）。
    pub fn user_ids(&self) -> Vec<UserId> {
        self.lock().keys().copied().collect()
    }

    /// 周期关闭时合并累积结果。
    ///
    /// - FULL：用累积结果整体替换；
    /// - USER：累积非空则加入该用户，为空则移除上下文中的用户；
    /// - 其余范围不修改集合。
    pub fn apply(
        &self,
        scope: Scope,
        context_user: Option<UserId>,
        accumulator: UserAccumulator,
    ) -> Transitions {
        let mut users = self.lock();
        let mut transitions = Transitions::default();
        match scope {
            Scope::Full => {
                for (user_id, suid) in users.iter() {
                    if !accumulator.users.contains_key(user_id) {
                        transitions.disabled.push(UserRef {
                            user_id: *user_id,
                            suid: suid.clone(),
                        });
                    }
                }
                for (user_id, suid) in &accumulator.users {
                    if !users.contains_key(user_id) {
                        transitions.enabled.push(UserRef {
                            user_id: *user_id,
                            suid: suid.clone(),
                        });
                    }
                }
                *users = accumulator.users;
            }
            Scope::User => match accumulator.users.into_iter().next() {
                Some((user_id, suid)) => {
                    if users.insert(user_id, suid.clone()).is_none() {
                        transitions.enabled.push(UserRef { user_id, suid });
                    }
                }
                None => {
                    let removed = context_user.and_then(|user_id| {
                        users
                            .remove(&user_id)
                            .map(|suid| UserRef { user_id, suid })
                    });
                    transitions.disabled.extend(removed);
                }
            },
            Scope::Device | Scope::ChannelState => {}
        }
        transitions
    }
}
