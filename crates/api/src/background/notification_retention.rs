//! Periodic cleanup of old notifications and expired cache entries.
//!
//! Deletes notifications older than the configured retention window and
//! reclaims expired cache entries. Runs on a fixed interval using
//! `tokio::time::interval`. Interest profiles are never touched.

use std::sync::Arc;
use std::time::Duration;

use sfmcp_store::{CacheStore, MonitoringStore};
use tokio_util::sync::CancellationToken;

use crate::engine::monitoring;

/// Run the retention loop until `cancel` is triggered.
pub async fn run(
    store: Arc<MonitoringStore>,
    cache: Arc<dyn CacheStore>,
    retention_days: i64,
    interval: Duration,
    cancel: CancellationToken,
) {
    tracing::info!(
        retention_days,
        interval_secs = interval.as_secs(),
        "Notification retention job started"
    );

    let mut interval = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Notification retention job stopping");
                break;
            }
            _ = interval.tick() => {
                run_once(&store, cache.as_ref(), retention_days).await;
            }
        }
    }
}

/// One retention pass.
pub async fn run_once(store: &MonitoringStore, cache: &dyn CacheStore, retention_days: i64) {
    match monitoring::cleanup(store, retention_days).await {
        Ok(deleted) if deleted > 0 => {
            tracing::info!(deleted, "Notification retention: purged old notifications");
        }
        Ok(_) => tracing::debug!("Notification retention: nothing to purge"),
        Err(e) => tracing::error!(error = %e, "Notification retention: cleanup failed"),
    }

    match cache.purge_expired().await {
        Ok(purged) if purged > 0 => {
            tracing::info!(purged, cache = cache.name(), "Cache retention: purged expired entries");
        }
        Ok(_) => {}
        Err(e) => tracing::error!(error = %e, "Cache retention: purge failed"),
    }
}
