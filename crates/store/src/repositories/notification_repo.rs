//! Notification history and per-profile dedup set.

use std::collections::{BTreeMap, HashSet};

use sfmcp_core::monitoring::{Notification, SourceItem};
use sfmcp_core::types::{DbId, Timestamp};
use tokio::sync::RwLock;

#[derive(Default)]
struct State {
    next_id: DbId,
    notifications: Vec<Notification>,
    /// `(profile_id, "source:id")` of every retained notification.
    seen: HashSet<(DbId, String)>,
}

/// In-memory notification log.
///
/// Dedup and insert happen under a single write lock, so two concurrent
/// checks of the same profile cannot both record the same item.
#[derive(Default)]
pub struct NotificationRepo {
    state: RwLock<State>,
}

impl NotificationRepo {
    /// Record every item not yet notified for `profile_id`. Returns only the
    /// notifications that were actually created.
    pub async fn record_new(
        &self,
        profile_id: DbId,
        items: Vec<SourceItem>,
        now: Timestamp,
    ) -> Vec<Notification> {
        let mut state = self.state.write().await;
        let mut created = Vec::new();
        for item in items {
            if !state.seen.insert((profile_id, item.key())) {
                continue;
            }
            state.next_id += 1;
            let notification = Notification {
                id: state.next_id,
                profile_id,
                source: item.source.clone(),
                item,
                created_at: now,
            };
            state.notifications.push(notification.clone());
            created.push(notification);
        }
        created
    }

    /// Notifications for one profile, oldest first.
    pub async fn list_for_profile(&self, profile_id: DbId) -> Vec<Notification> {
        self.state
            .read()
            .await
            .notifications
            .iter()
            .filter(|n| n.profile_id == profile_id)
            .cloned()
            .collect()
    }

    /// Delete notifications created before `cutoff`. Their items become
    /// eligible for notification again. Returns the number deleted.
    pub async fn delete_older_than(&self, cutoff: Timestamp) -> usize {
        let mut state = self.state.write().await;
        let before = state.notifications.len();
        let (keep, expired): (Vec<_>, Vec<_>) = std::mem::take(&mut state.notifications)
            .into_iter()
            .partition(|n| n.created_at >= cutoff);
        for n in &expired {
            state.seen.remove(&(n.profile_id, n.item.key()));
        }
        state.notifications = keep;
        before - state.notifications.len()
    }

    pub async fn count(&self) -> usize {
        self.state.read().await.notifications.len()
    }

    /// Notification counts keyed by source name.
    pub async fn count_by_source(&self) -> BTreeMap<String, usize> {
        let state = self.state.read().await;
        let mut counts = BTreeMap::new();
        for n in &state.notifications {
            *counts.entry(n.source.clone()).or_insert(0) += 1;
        }
        counts
    }
}
