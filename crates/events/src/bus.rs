//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the publish/subscribe hub for [`MonitoringEvent`]s. It is
//! shared via `Arc<EventBus>` between the monitoring engine (publisher) and
//! the [`DeliveryRouter`](crate::router::DeliveryRouter) (subscriber).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sfmcp_core::types::DbId;
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// MonitoringEvent
// ---------------------------------------------------------------------------

/// Something the notification sinks may need to hear about.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringEvent {
    /// Dot-separated event name, e.g. `"monitoring.new_items"`.
    pub event_type: String,

    /// Profile whose check produced the event, if any.
    pub profile_id: Option<DbId>,

    /// Delivery channels requested by the profile (`webhook`, `email`).
    #[serde(default)]
    pub channels: Vec<String>,

    /// Restrict webhook delivery to this registration id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_id: Option<String>,

    pub payload: serde_json::Value,

    pub timestamp: DateTime<Utc>,
}

impl MonitoringEvent {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            profile_id: None,
            channels: Vec::new(),
            webhook_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    pub fn with_profile(mut self, profile_id: DbId) -> Self {
        self.profile_id = Some(profile_id);
        self
    }

    pub fn with_channels(mut self, channels: Vec<String>) -> Self {
        self.channels = channels;
        self
    }

    /// Deliver only to one webhook, regardless of its subscriptions.
    pub fn for_webhook(mut self, id: impl Into<String>) -> Self {
        self.webhook_id = Some(id.into());
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    pub fn wants(&self, channel: &str) -> bool {
        self.channels.iter().any(|c| c == channel)
    }

    /// The JSON body sent to webhooks and rendered into emails.
    pub fn to_wire(&self) -> serde_json::Value {
        serde_json::json!({
            "event_type": self.event_type,
            "profile_id": self.profile_id,
            "payload": self.payload,
            "timestamp": self.timestamp,
        })
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// In-process fan-out event bus.
pub struct EventBus {
    sender: broadcast::Sender<MonitoringEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers. Returns how many
    /// subscribers received it.
    pub fn publish(&self, event: MonitoringEvent) -> usize {
        // A send error only means there are zero receivers.
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MonitoringEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
