//! 设备删除的主题快照
//!
//! 删除前记录设备当前发布的全部主题，删除后取出快照逐个清除。
//! 快照超过有效期即作废，删除通知来得太晚时不再清除。

use domain::{DeviceId, UserId};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// 快照默认有效期。
pub const DEVICE_SNAPSHOT_TTL: Duration = Duration::from_secs(10);

struct DeviceSnapshot {
    topics: Vec<String>,
    taken_at: Instant,
}

/// 待删除设备的主题快照表。
pub struct DeletedDeviceTopics {
    ttl: Duration,
    snapshots: Mutex<HashMap<(UserId, DeviceId), DeviceSnapshot>>,
}

impl DeletedDeviceTopics {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            snapshots: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<(UserId, DeviceId), DeviceSnapshot>> {
        self.snapshots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 记录快照，替换同一设备的旧快照，并顺带丢弃过期快照。
    pub fn remember(&self, user_id: UserId, device_id: DeviceId, topics: Vec<String>) {
        let now = Instant::now();
        let mut snapshots = self.lock();
        snapshots.retain(|_, snapshot| now.duration_since(snapshot.taken_at) < self.ttl);
        snapshots.insert(
            (user_id, device_id),
            DeviceSnapshot {
                topics,
                taken_at: now,
            },
        );
    }

    /// 取出快照；不存在或已过期返回 `None`。
    pub fn take(&self, user_id: UserId, device_id: DeviceId) -> Option<Vec<String>> {
        let snapshot = self.lock().remove(&(user_id, device_id))?;
        if snapshot.taken_at.elapsed() >= self.ttl {
            return None;
        }
        Some(snapshot.topics)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl Default for DeletedDeviceTopics {
    fn default() -> Self {
        Self::new(DEVICE_SNAPSHOT_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn snapshot_is_taken_once_within_ttl() {
        let table = DeletedDeviceTopics::default();
        table.remember(1, 10, vec!["supla/u1/devices/10/name".to_string()]);
        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(
            table.take(1, 10),
            Some(vec!["supla/u1/devices/10/name".to_string()])
        );
        assert_eq!(table.take(1, 10), None);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_snapshot_is_dropped() {
        let table = DeletedDeviceTopics::default();
        table.remember(1, 10, vec!["supla/u1/devices/10/name".to_string()]);
        tokio::time::advance(Duration::from_secs(15)).await;
        assert_eq!(table.take(1, 10), None);

        table.remember(1, 10, Vec::new());
        tokio::time::advance(Duration::from_secs(11)).await;
        table.remember(2, 20, Vec::new());
        assert_eq!(table.len(), 1);
    }
}
