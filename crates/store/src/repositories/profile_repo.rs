//! Interest profile storage.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};

use sfmcp_core::monitoring::{CreateInterestProfile, InterestProfile};
use sfmcp_core::types::{DbId, Timestamp};
use tokio::sync::RwLock;

/// In-memory CRUD for interest profiles. Ids are assigned monotonically and
/// never reused, even after a delete.
pub struct ProfileRepo {
    next_id: AtomicI64,
    pub(crate) profiles: RwLock<BTreeMap<DbId, InterestProfile>>,
}

impl Default for ProfileRepo {
    fn default() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            profiles: RwLock::new(BTreeMap::new()),
        }
    }
}

impl ProfileRepo {
    /// Store a new profile and return it with its assigned id.
    pub async fn create(&self, input: CreateInterestProfile, now: Timestamp) -> InterestProfile {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let profile = InterestProfile::from_create(id, input, now);
        self.profiles.write().await.insert(id, profile.clone());
        profile
    }

    pub async fn find_by_id(&self, id: DbId) -> Option<InterestProfile> {
        self.profiles.read().await.get(&id).cloned()
    }

    /// All profiles ordered by id.
    pub async fn list(&self) -> Vec<InterestProfile> {
        self.profiles.read().await.values().cloned().collect()
    }

    /// Delete a profile. Returns `true` if it existed.
    pub async fn delete(&self, id: DbId) -> bool {
        self.profiles.write().await.remove(&id).is_some()
    }

    /// Record that a check ran. Returns the updated profile, or `None` if it
    /// was deleted while the check was in flight.
    pub async fn mark_checked(&self, id: DbId, at: Timestamp) -> Option<InterestProfile> {
        let mut profiles = self.profiles.write().await;
        let profile = profiles.get_mut(&id)?;
        profile.last_checked = Some(at);
        Some(profile.clone())
    }

    pub async fn count(&self) -> usize {
        self.profiles.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn input(name: &str) -> CreateInterestProfile {
        CreateInterestProfile {
            name: name.into(),
            sources: vec!["wikipedia".into()],
            keywords: vec!["cyberpunk".into()],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn ids_are_monotonic_and_not_reused() {
        let repo = ProfileRepo::default();
        let a = repo.create(input("a"), Utc::now()).await;
        let b = repo.create(input("b"), Utc::now()).await;
        assert_eq!((a.profile_id, b.profile_id), (1, 2));

        assert!(repo.delete(b.profile_id).await);
        let c = repo.create(input("c"), Utc::now()).await;
        assert_eq!(c.profile_id, 3);
    }

    #[tokio::test]
    async fn delete_twice_reports_missing() {
        let repo = ProfileRepo::default();
        let p = repo.create(input("a"), Utc::now()).await;
        assert!(repo.delete(p.profile_id).await);
        assert!(!repo.delete(p.profile_id).await);
        assert!(repo.find_by_id(p.profile_id).await.is_none());
    }

    #[tokio::test]
    async fn mark_checked_updates_last_checked() {
        let repo = ProfileRepo::default();
        let p = repo.create(input("a"), Utc::now()).await;
        assert!(p.last_checked.is_none());

        let at = Utc::now();
        let updated = repo.mark_checked(p.profile_id, at).await.unwrap();
        assert_eq!(updated.last_checked, Some(at));
        assert!(repo.mark_checked(99, at).await.is_none());
    }
}
