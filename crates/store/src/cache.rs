//! Response cache keyed by request fingerprint.
//!
//! Entries carry a fixed TTL. An entry is valid while
//! `now - created_at < ttl`; a lookup that finds an expired entry reports a
//! miss and leaves the entry in place. Reclamation happens only through
//! [`CacheStore::purge_expired`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use sfmcp_core::fingerprint::CacheKey;
use sfmcp_core::types::Timestamp;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::error::StoreError;

/// Default entry lifetime: one hour.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

/// A cached payload and the wall-clock time it was stored.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedValue {
    pub value: Value,
    pub stored_at: Timestamp,
}

/// Counters exposed by `GET /health`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
    /// Stored entries, including expired ones not yet purged.
    pub entries: usize,
    pub ttl_secs: u64,
}

/// Keyed response store shared by the dispatcher and the source proxy.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &CacheKey) -> Result<Option<CachedValue>, StoreError>;
    async fn put(&self, key: &CacheKey, value: Value) -> Result<(), StoreError>;
    /// Remove one entry. Returns whether an entry existed.
    async fn invalidate(&self, key: &CacheKey) -> Result<bool, StoreError>;
    /// Drop every expired entry. Returns how many were removed.
    async fn purge_expired(&self) -> Result<usize, StoreError>;
    async fn stats(&self) -> CacheStats;
    fn name(&self) -> &'static str;
}

struct Entry {
    value: Value,
    stored_at: Timestamp,
    created: Instant,
}

impl Entry {
    fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.duration_since(self.created) >= ttl
    }
}

/// In-process [`CacheStore`] backed by a `HashMap` behind a `tokio` lock.
pub struct MemoryCacheStore {
    entries: RwLock<HashMap<String, Entry>>,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
}

impl MemoryCacheStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            writes: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl Default for MemoryCacheStore {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &CacheKey) -> Result<Option<CachedValue>, StoreError> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        let found = entries
            .get(key.as_str())
            .filter(|e| !e.is_expired(now, self.ttl))
            .map(|e| CachedValue {
                value: e.value.clone(),
                stored_at: e.stored_at,
            });
        drop(entries);

        match &found {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        Ok(found)
    }

    async fn put(&self, key: &CacheKey, value: Value) -> Result<(), StoreError> {
        let entry = Entry {
            value,
            stored_at: Utc::now(),
            created: Instant::now(),
        };
        self.entries
            .write()
            .await
            .insert(key.as_str().to_string(), entry);
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn invalidate(&self, key: &CacheKey) -> Result<bool, StoreError> {
        Ok(self.entries.write().await.remove(key.as_str()).is_some())
    }

    async fn purge_expired(&self) -> Result<usize, StoreError> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, e| !e.is_expired(now, self.ttl));
        let removed = before - entries.len();
        if removed > 0 {
            tracing::debug!(removed, remaining = entries.len(), "Purged expired cache entries");
        }
        Ok(removed)
    }

    async fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            entries: self.entries.read().await.len(),
            ttl_secs: self.ttl.as_secs(),
        }
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
