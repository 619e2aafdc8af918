//! Well-known notification channel name constants.
//!
//! These must match the values accepted in an interest profile's
//! `notification_preferences.channels` list and the names the delivery
//! router checks before dispatching.

/// Notification kept in the monitoring store and served over the HTTP API.
pub const CHANNEL_API: &str = "api";

/// Notification delivered to every webhook subscribed to the event.
pub const CHANNEL_WEBHOOK: &str = "webhook";

/// Notification delivered via SMTP to the configured recipients.
pub const CHANNEL_EMAIL: &str = "email";

/// All channel names a profile may list.
pub const KNOWN_CHANNELS: [&str; 3] = [CHANNEL_API, CHANNEL_WEBHOOK, CHANNEL_EMAIL];

/// Event name published when a monitoring check finds new items.
pub const EVENT_NEW_ITEMS: &str = "monitoring.new_items";

/// Event name published for a webhook connectivity test.
pub const EVENT_WEBHOOK_TEST: &str = "webhook.test";
