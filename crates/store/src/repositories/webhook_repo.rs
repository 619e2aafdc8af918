//! Webhook registrations keyed by caller-chosen id.

use std::collections::BTreeMap;

use sfmcp_core::monitoring::WebhookRegistration;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct WebhookRepo {
    webhooks: RwLock<BTreeMap<String, WebhookRegistration>>,
}

impl WebhookRepo {
    /// Insert or replace a registration. Returns `true` when an existing
    /// registration was replaced.
    pub async fn upsert(&self, registration: WebhookRegistration) -> bool {
        self.webhooks
            .write()
            .await
            .insert(registration.id.clone(), registration)
            .is_some()
    }

    pub async fn delete(&self, id: &str) -> bool {
        self.webhooks.write().await.remove(id).is_some()
    }

    pub async fn find_by_id(&self, id: &str) -> Option<WebhookRegistration> {
        self.webhooks.read().await.get(id).cloned()
    }

    pub async fn list(&self) -> Vec<WebhookRegistration> {
        self.webhooks.read().await.values().cloned().collect()
    }

    /// Registrations subscribed to `event_type`.
    pub async fn subscribed_to(&self, event_type: &str) -> Vec<WebhookRegistration> {
        self.webhooks
            .read()
            .await
            .values()
            .filter(|w| w.subscribes_to(event_type))
            .cloned()
            .collect()
    }

    pub async fn count(&self) -> usize {
        self.webhooks.read().await.len()
    }
}
