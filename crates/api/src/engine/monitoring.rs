//! Interest-profile checks, retention cleanup and statistics.
//!
//! A check asks every source on the profile about each keyword and author,
//! keeps the items that match the profile, records those not notified
//! before and publishes one `monitoring.new_items` event carrying the
//! profile's channels. A failing source is reported in the outcome and does
//! not abort the check.

use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use serde::Serialize;
use sfmcp_core::channels::EVENT_NEW_ITEMS;
use sfmcp_core::error::CoreError;
use sfmcp_core::monitoring::{
    matches_profile, validate_retention_days, InterestProfile, MonitoringStatistics, Notification,
    SourceItem,
};
use sfmcp_core::types::{DbId, Timestamp};
use sfmcp_events::{EventBus, MonitoringEvent};
use sfmcp_store::MonitoringStore;
use sfmcp_upstream::{with_retry, MonitorQuery, SourceRegistry};

use crate::error::{AppError, AppResult};

/// A source that could not be queried during a check.
#[derive(Debug, Clone, Serialize)]
pub struct SourceFailure {
    pub source: String,
    pub error: String,
}

/// Result of checking one profile.
#[derive(Debug, Clone, Serialize)]
pub struct CheckOutcome {
    pub profile_id: DbId,
    pub checked_at: Timestamp,
    pub new_notifications: Vec<Notification>,
    pub failed_sources: Vec<SourceFailure>,
}

#[derive(Clone)]
pub struct ProfileChecker {
    sources: Arc<SourceRegistry>,
    store: Arc<MonitoringStore>,
    event_bus: Arc<EventBus>,
}

impl ProfileChecker {
    pub fn new(
        sources: Arc<SourceRegistry>,
        store: Arc<MonitoringStore>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            sources,
            store,
            event_bus,
        }
    }

    /// Check one profile for new matching items.
    pub async fn check(&self, profile_id: DbId) -> AppResult<CheckOutcome> {
        let profile = self
            .store
            .profiles
            .find_by_id(profile_id)
            .await
            .ok_or_else(|| profile_missing(profile_id))?;

        let (items, failed_sources) = self.collect_items(&profile).await;
        let now = Utc::now();
        let created = self
            .store
            .record_notifications(profile_id, items, now)
            .await
            .ok_or_else(|| profile_missing(profile_id))?;

        if !created.is_empty() {
            self.publish(&profile, &created);
        }
        self.store.profiles.mark_checked(profile_id, now).await;

        tracing::info!(
            profile_id,
            new_items = created.len(),
            failed_sources = failed_sources.len(),
            "Profile checked"
        );

        Ok(CheckOutcome {
            profile_id,
            checked_at: now,
            new_notifications: created,
            failed_sources,
        })
    }

    /// Check every profile concurrently.
    pub async fn check_all(&self) -> Vec<CheckOutcome> {
        let ids: Vec<DbId> = self
            .store
            .profiles
            .list()
            .await
            .into_iter()
            .map(|p| p.profile_id)
            .collect();

        join_all(ids.into_iter().map(|id| self.check(id)))
            .await
            .into_iter()
            // A profile deleted mid-run is skipped.
            .filter_map(Result::ok)
            .collect()
    }

    /// Query each source of the profile, returning matching items and the
    /// sources that failed.
    async fn collect_items(&self, profile: &InterestProfile) -> (Vec<SourceItem>, Vec<SourceFailure>) {
        let queries: Vec<MonitorQuery> = profile
            .keywords
            .iter()
            .map(|k| MonitorQuery::Keyword(k.clone()))
            .chain(profile.authors.iter().map(|a| MonitorQuery::Author(a.clone())))
            .collect();

        let mut items = Vec::new();
        let mut failures = Vec::new();

        for name in &profile.sources {
            let source = match self.sources.get(name) {
                Ok(source) => source,
                Err(e) => {
                    failures.push(SourceFailure {
                        source: name.clone(),
                        error: e.to_string(),
                    });
                    continue;
                }
            };

            for query in &queries {
                let label = format!("monitor:{name}");
                match with_retry(&label, || source.find_items(query)).await {
                    Ok(found) => items.extend(found.into_iter().filter(|i| matches_profile(i, profile))),
                    Err(e) => {
                        tracing::warn!(profile_id = profile.profile_id, source = %name, error = %e, "Source query failed");
                        failures.push(SourceFailure {
                            source: name.clone(),
                            error: e.to_string(),
                        });
                        break;
                    }
                }
            }
        }
        (items, failures)
    }

    fn publish(&self, profile: &InterestProfile, created: &[Notification]) {
        let items: Vec<&SourceItem> = created.iter().map(|n| &n.item).collect();
        let event = MonitoringEvent::new(EVENT_NEW_ITEMS)
            .with_profile(profile.profile_id)
            .with_channels(profile.notification_preferences.channels.clone())
            .with_payload(serde_json::json!({
                "profile_name": profile.name,
                "count": created.len(),
                "items": items,
            }));
        let receivers = self.event_bus.publish(event);
        tracing::debug!(profile_id = profile.profile_id, receivers, "Published new-items event");
    }
}

fn profile_missing(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "InterestProfile",
        id,
    })
}

/// Delete notifications older than `days`. Profiles are never touched.
pub async fn cleanup(store: &MonitoringStore, days: i64) -> AppResult<usize> {
    validate_retention_days(days)?;
    let cutoff = Utc::now() - chrono::Duration::days(days);
    Ok(store.notifications.delete_older_than(cutoff).await)
}

pub async fn statistics(store: &MonitoringStore, email_configured: bool) -> MonitoringStatistics {
    MonitoringStatistics {
        total_profiles: store.profiles.count().await,
        total_notifications: store.notifications.count().await,
        total_webhooks: store.webhooks.count().await,
        notifications_by_source: store.notifications.count_by_source().await,
        email_configured,
    }
}
