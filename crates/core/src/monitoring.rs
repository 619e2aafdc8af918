//! Interest profiles, notifications and webhook registrations.
//!
//! Defines the monitoring data model, the rules used to match source items
//! against a profile, and the validation helpers used by the API layer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::channels::{CHANNEL_API, EVENT_NEW_ITEMS, KNOWN_CHANNELS};
use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Sources that can be polled by a monitoring check.
pub const MONITORABLE_SOURCES: &[&str] = &["wikipedia", "openlibrary", "goodreads", "rpggeek", "gcd"];

/// Default notification retention window in days.
pub const DEFAULT_RETENTION_DAYS: i64 = 30;

/// Maximum keywords or authors on a single profile.
pub const MAX_PROFILE_TERMS: usize = 50;

/// Maximum custom headers on a webhook registration.
pub const MAX_WEBHOOK_HEADERS: usize = 20;

// ---------------------------------------------------------------------------
// Profiles
// ---------------------------------------------------------------------------

/// How often the owner of a profile expects to be notified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationFrequency {
    Immediate,
    Hourly,
    #[default]
    Daily,
    Weekly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPreferences {
    #[serde(default)]
    pub frequency: NotificationFrequency,
    #[serde(default = "default_channels")]
    pub channels: Vec<String>,
}

fn default_channels() -> Vec<String> {
    vec![CHANNEL_API.to_string()]
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            frequency: NotificationFrequency::default(),
            channels: default_channels(),
        }
    }
}

impl NotificationPreferences {
    pub fn has_channel(&self, channel: &str) -> bool {
        self.channels.iter().any(|c| c == channel)
    }
}

/// Body of `POST /monitoring/profile`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateInterestProfile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub notification_preferences: NotificationPreferences,
}

/// A saved keyword/author/source filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterestProfile {
    pub profile_id: DbId,
    pub name: String,
    pub sources: Vec<String>,
    pub keywords: Vec<String>,
    pub authors: Vec<String>,
    pub notification_preferences: NotificationPreferences,
    pub created_at: Timestamp,
    pub last_checked: Option<Timestamp>,
}

impl InterestProfile {
    pub fn from_create(id: DbId, input: CreateInterestProfile, now: Timestamp) -> Self {
        Self {
            profile_id: id,
            name: input.name.trim().to_string(),
            sources: input.sources,
            keywords: input.keywords,
            authors: input.authors,
            notification_preferences: input.notification_preferences,
            created_at: now,
            last_checked: None,
        }
    }
}

/// Validate a new profile.
///
/// - `name` must be non-empty.
/// - `sources` must be non-empty and each one monitorable.
/// - At least one keyword or author is required.
/// - Every channel must be a known channel.
pub fn validate_profile(input: &CreateInterestProfile) -> Result<(), CoreError> {
    if input.name.trim().is_empty() {
        return Err(CoreError::Validation("Profile name must not be empty".into()));
    }
    if input.sources.is_empty() {
        return Err(CoreError::Validation(
            "Profile must list at least one source".into(),
        ));
    }
    for source in &input.sources {
        if !MONITORABLE_SOURCES.contains(&source.as_str()) {
            return Err(CoreError::Validation(format!(
                "Source '{}' cannot be monitored. Must be one of: {:?}",
                source, MONITORABLE_SOURCES
            )));
        }
    }
    if input.keywords.iter().all(|k| k.trim().is_empty())
        && input.authors.iter().all(|a| a.trim().is_empty())
    {
        return Err(CoreError::Validation(
            "Profile must have at least one keyword or author".into(),
        ));
    }
    if input.keywords.len() > MAX_PROFILE_TERMS || input.authors.len() > MAX_PROFILE_TERMS {
        return Err(CoreError::Validation(format!(
            "Profiles are limited to {MAX_PROFILE_TERMS} keywords and {MAX_PROFILE_TERMS} authors"
        )));
    }
    for channel in &input.notification_preferences.channels {
        if !KNOWN_CHANNELS.contains(&channel.as_str()) {
            return Err(CoreError::Validation(format!(
                "Unknown notification channel '{}'. Must be one of: {:?}",
                channel, KNOWN_CHANNELS
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Items and notifications
// ---------------------------------------------------------------------------

/// A normalized item returned by a source during a monitoring check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceItem {
    pub source: String,
    pub id: String,
    pub title: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
}

impl SourceItem {
    /// Dedup key, unique across sources.
    pub fn key(&self) -> String {
        item_key(&self.source, &self.id)
    }
}

pub fn item_key(source: &str, id: &str) -> String {
    format!("{source}:{id}")
}

/// Whether an item is of interest to a profile.
///
/// Keywords match case-insensitively anywhere in the item's text fields;
/// authors must match the item's author exactly.
pub fn matches_profile(item: &SourceItem, profile: &InterestProfile) -> bool {
    let haystack = [&item.title, &item.author, &item.description]
        .into_iter()
        .flatten()
        .map(|s| s.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ");

    let keyword_hit = profile
        .keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .any(|k| haystack.contains(&k));
    if keyword_hit {
        return true;
    }

    item.author
        .as_deref()
        .is_some_and(|author| profile.authors.iter().any(|a| a == author))
}

/// A recorded match of an item against a profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: DbId,
    /// Lookup-only reference; the profile may since have been deleted.
    pub profile_id: DbId,
    pub source: String,
    pub item: SourceItem,
    pub created_at: Timestamp,
}

/// Aggregate counts served by `GET /monitoring/statistics`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonitoringStatistics {
    pub total_profiles: usize,
    pub total_notifications: usize,
    pub total_webhooks: usize,
    pub notifications_by_source: BTreeMap<String, usize>,
    pub email_configured: bool,
}

// ---------------------------------------------------------------------------
// Webhooks
// ---------------------------------------------------------------------------

/// Body of `POST /monitoring/webhook/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterWebhook {
    #[serde(default)]
    pub url: String,
    pub secret: Option<String>,
    #[serde(default)]
    pub events: Vec<String>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookRegistration {
    pub id: String,
    pub url: String,
    #[serde(skip_serializing)]
    pub secret: Option<String>,
    pub events: Vec<String>,
    pub headers: BTreeMap<String, String>,
    pub registered_at: Timestamp,
}

impl WebhookRegistration {
    /// Build a registration. No events means the default `monitoring.new_items`.
    pub fn from_register(id: &str, input: RegisterWebhook, now: Timestamp) -> Self {
        let events = if input.events.is_empty() {
            vec![EVENT_NEW_ITEMS.to_string()]
        } else {
            input.events
        };
        Self {
            id: id.to_string(),
            url: input.url.trim().to_string(),
            secret: input.secret.filter(|s| !s.is_empty()),
            events,
            headers: input.headers,
            registered_at: now,
        }
    }

    pub fn subscribes_to(&self, event_type: &str) -> bool {
        self.events.iter().any(|e| e == event_type)
    }
}

/// Validate a webhook id and registration body.
pub fn validate_webhook(id: &str, input: &RegisterWebhook) -> Result<(), CoreError> {
    if id.trim().is_empty() {
        return Err(CoreError::Validation("Webhook id must not be empty".into()));
    }
    let url = input.url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(CoreError::Validation(format!(
            "Webhook url must be an http(s) URL, got '{url}'"
        )));
    }
    if input.headers.len() > MAX_WEBHOOK_HEADERS {
        return Err(CoreError::Validation(format!(
            "Webhooks are limited to {MAX_WEBHOOK_HEADERS} custom headers"
        )));
    }
    for (name, value) in &input.headers {
        if http::HeaderName::from_bytes(name.as_bytes()).is_err() {
            return Err(CoreError::Validation(format!(
                "Invalid webhook header name '{name}'"
            )));
        }
        if http::HeaderValue::from_str(value).is_err() {
            return Err(CoreError::Validation(format!(
                "Invalid value for webhook header '{name}'"
            )));
        }
    }
    if input.events.iter().any(|e| e.trim().is_empty()) {
        return Err(CoreError::Validation("Event names must not be empty".into()));
    }
    Ok(())
}

/// Validate a retention window in days.
pub fn validate_retention_days(days: i64) -> Result<(), CoreError> {
    if days < 1 {
        return Err(CoreError::Validation(format!(
            "Retention must be at least 1 day (got {days})"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn create(keywords: &[&str], authors: &[&str]) -> CreateInterestProfile {
        CreateInterestProfile {
            name: "Cyberpunk".into(),
            sources: vec!["wikipedia".into()],
            keywords: keywords.iter().map(|s| s.to_string()).collect(),
            authors: authors.iter().map(|s| s.to_string()).collect(),
            notification_preferences: NotificationPreferences::default(),
        }
    }

    fn item(title: &str, author: Option<&str>) -> SourceItem {
        SourceItem {
            source: "wikipedia".into(),
            id: title.to_lowercase().replace(' ', "_"),
            title: Some(title.into()),
            author: author.map(Into::into),
            description: None,
            url: None,
        }
    }

    #[test]
    fn valid_profile_passes() {
        assert!(validate_profile(&create(&["cyberpunk"], &[])).is_ok());
    }

    #[test]
    fn profile_without_terms_is_rejected() {
        assert!(validate_profile(&create(&[], &[])).is_err());
        assert!(validate_profile(&create(&["  "], &[])).is_err());
    }

    #[test]
    fn profile_with_unknown_source_is_rejected() {
        let mut input = create(&["cyberpunk"], &[]);
        input.sources = vec!["myspace".into()];
        assert!(validate_profile(&input).is_err());
    }

    #[test]
    fn profile_with_unknown_channel_is_rejected() {
        let mut input = create(&["cyberpunk"], &[]);
        input.notification_preferences.channels = vec!["pager".into()];
        assert!(validate_profile(&input).is_err());
    }

    #[test]
    fn default_preferences_use_api_channel() {
        let prefs: NotificationPreferences = serde_json::from_str("{}").unwrap();
        assert_eq!(prefs.channels, vec!["api"]);
        assert_eq!(prefs.frequency, NotificationFrequency::Daily);
    }

    #[test]
    fn keyword_match_is_case_insensitive_substring() {
        let profile = InterestProfile::from_create(1, create(&["Cyberpunk"], &[]), Utc::now());
        assert!(matches_profile(&item("Cyberpunk derivatives", None), &profile));
        assert!(matches_profile(&item("Post-cyberpunk", None), &profile));
        assert!(!matches_profile(&item("Space opera", None), &profile));
    }

    #[test]
    fn author_match_is_exact() {
        let profile =
            InterestProfile::from_create(1, create(&[], &["William Gibson"]), Utc::now());
        assert!(matches_profile(&item("Neuromancer", Some("William Gibson")), &profile));
        assert!(!matches_profile(&item("Neuromancer", Some("william gibson")), &profile));
    }

    #[test]
    fn item_key_combines_source_and_id() {
        assert_eq!(item("Dune", None).key(), "wikipedia:dune");
    }

    #[test]
    fn webhook_defaults_to_new_items_event() {
        let input = RegisterWebhook {
            url: "https://example.com/hook".into(),
            ..Default::default()
        };
        assert!(validate_webhook("w1", &input).is_ok());
        let reg = WebhookRegistration::from_register("w1", input, Utc::now());
        assert!(reg.subscribes_to(EVENT_NEW_ITEMS));
    }

    #[test]
    fn webhook_requires_http_url() {
        let input = RegisterWebhook {
            url: "ftp://example.com".into(),
            ..Default::default()
        };
        assert!(validate_webhook("w1", &input).is_err());
    }

    #[test]
    fn webhook_headers_must_be_sendable() {
        let with_header = |name: &str, value: &str| RegisterWebhook {
            url: "https://example.com/hook".into(),
            headers: BTreeMap::from([(name.to_string(), value.to_string())]),
            ..Default::default()
        };
        assert!(validate_webhook("w1", &with_header("X-Api-Key", "abc")).is_ok());
        assert!(validate_webhook("w1", &with_header("bad header", "abc")).is_err());
        assert!(validate_webhook("w1", &with_header("X-Api-Key", "line\nbreak")).is_err());
    }

    #[test]
    fn retention_must_be_positive() {
        assert!(validate_retention_days(30).is_ok());
        assert!(validate_retention_days(0).is_err());
    }
}
