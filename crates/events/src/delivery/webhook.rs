//! Webhook delivery with exponential-backoff retry.
//!
//! [`WebhookDelivery`] POSTs a JSON-encoded [`MonitoringEvent`] to a
//! registered URL. When the registration has a secret the body is signed
//! with HMAC-SHA256 and the hex digest sent in [`SIGNATURE_HEADER`] as
//! `sha256=<hex>`. Failed attempts are retried three times (1 s, 2 s, 4 s).

use std::time::Duration;

use reqwest::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use sfmcp_core::hashing::compute_webhook_hmac;
use sfmcp_core::monitoring::WebhookRegistration;

use crate::bus::MonitoringEvent;

/// Retry delays in seconds (exponential backoff: 1s, 2s, 4s).
const RETRY_DELAYS_SECS: [u64; 3] = [1, 2, 4];

/// HTTP request timeout for a single delivery attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub const SIGNATURE_HEADER: &str = "x-signature-256";
pub const EVENT_HEADER: &str = "x-sfmcp-event";

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The remote server returned a non-2xx status code.
    #[error("Webhook returned HTTP {0}")]
    HttpStatus(u16),

    /// A custom header on the registration is not a valid HTTP header.
    #[error("Invalid webhook header '{0}'")]
    InvalidHeader(String),
}

// ---------------------------------------------------------------------------
// WebhookDelivery
// ---------------------------------------------------------------------------

pub struct WebhookDelivery {
    client: reqwest::Client,
    retry_delays: Vec<Duration>,
}

impl WebhookDelivery {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self {
            client,
            retry_delays: RETRY_DELAYS_SECS.iter().map(|s| Duration::from_secs(*s)).collect(),
        }
    }

    /// Override the backoff schedule.
    pub fn with_retry_delays(mut self, delays: Vec<Duration>) -> Self {
        self.retry_delays = delays;
        self
    }

    /// Deliver an event to one webhook, retrying on failure.
    ///
    /// Returns `Ok(())` on the first successful attempt, otherwise the error
    /// of the last attempt.
    pub async fn deliver(
        &self,
        webhook: &WebhookRegistration,
        event: &MonitoringEvent,
    ) -> Result<(), WebhookError> {
        let body = event.to_wire().to_string();
        let headers = build_headers(webhook, event, &body)?;

        let mut delays = self.retry_delays.iter();
        let mut attempt = 1;
        loop {
            let err = match self.try_send(&webhook.url, &headers, &body).await {
                Ok(()) => return Ok(()),
                Err(e) => e,
            };
            let Some(delay) = delays.next() else {
                tracing::error!(
                    attempts = attempt,
                    webhook_id = %webhook.id,
                    error = %err,
                    "Webhook delivery failed after all retries"
                );
                return Err(err);
            };
            tracing::warn!(
                attempt,
                webhook_id = %webhook.id,
                error = %err,
                "Webhook delivery attempt failed, retrying"
            );
            tokio::time::sleep(*delay).await;
            attempt += 1;
        }
    }

    async fn try_send(
        &self,
        url: &str,
        headers: &reqwest::header::HeaderMap,
        body: &str,
    ) -> Result<(), WebhookError> {
        let response = self
            .client
            .post(url)
            .headers(headers.clone())
            .body(body.to_string())
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(WebhookError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }
}

impl Default for WebhookDelivery {
    fn default() -> Self {
        Self::new()
    }
}

fn build_headers(
    webhook: &WebhookRegistration,
    event: &MonitoringEvent,
    body: &str,
) -> Result<reqwest::header::HeaderMap, WebhookError> {
    let mut headers = reqwest::header::HeaderMap::new();
    for (name, value) in &webhook.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| WebhookError::InvalidHeader(name.clone()))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| WebhookError::InvalidHeader(name.to_string()))?;
        headers.insert(name, value);
    }
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Ok(v) = HeaderValue::from_str(&event.event_type) {
        headers.insert(EVENT_HEADER, v);
    }
    if let Some(secret) = webhook.secret.as_deref().filter(|s| !s.is_empty()) {
        let signature = format!("sha256={}", compute_webhook_hmac(secret, body));
        if let Ok(v) = HeaderValue::from_str(&signature) {
            headers.insert(SIGNATURE_HEADER, v);
        }
    }
    Ok(headers)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
