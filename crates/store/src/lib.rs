//! In-process stores for SFMCP.
//!
//! - [`cache`]: the fingerprint-keyed response cache behind the
//!   [`CacheStore`] trait.
//! - [`repositories`]: interest profiles, notifications and webhook
//!   registrations, bundled as [`MonitoringStore`].

pub mod cache;
pub mod error;
pub mod repositories;

pub use cache::{CacheStats, CacheStore, CachedValue, MemoryCacheStore};
pub use error::StoreError;
pub use repositories::{NotificationRepo, ProfileRepo, WebhookRepo};

use std::sync::Arc;

use sfmcp_core::monitoring::{Notification, SourceItem};
use sfmcp_core::types::{DbId, Timestamp};

/// Every monitoring repository, constructed once at start-up and shared.
#[derive(Default)]
pub struct MonitoringStore {
    pub profiles: ProfileRepo,
    pub notifications: NotificationRepo,
    /// Shared with the delivery router.
    pub webhooks: Arc<WebhookRepo>,
}

impl MonitoringStore {
    /// Record new notifications for `profile_id` while holding the profile
    /// table read lock, so a concurrent delete either happens before (and
    /// nothing is recorded) or waits until recording is done. Returns `None`
    /// if the profile no longer exists.
    pub async fn record_notifications(
        &self,
        profile_id: DbId,
        items: Vec<SourceItem>,
        now: Timestamp,
    ) -> Option<Vec<Notification>> {
        let profiles = self.profiles.profiles.read().await;
        if !profiles.contains_key(&profile_id) {
            return None;
        }
        Some(self.notifications.record_new(profile_id, items, now).await)
    }
}
