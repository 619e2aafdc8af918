//! Shared HTTP plumbing for upstream sources.
//!
//! Wraps a [`reqwest::Client`] bound to one base URL and translates
//! transport failures and status codes into [`UpstreamError`]:
//!
//! - `404` -> `NotFound`
//! - `202` (queued), `429`, `502`, `503`, `504`, timeouts and connection
//!   failures -> `TransientUnavailable`
//! - anything else non-2xx, or an undecodable body -> `Protocol`

use std::time::Duration;

use reqwest::header::RETRY_AFTER;
use reqwest::{StatusCode, Url};
use serde_json::Value;

use crate::error::UpstreamError;

/// User agent sent with every upstream request.
pub const USER_AGENT: &str = "SFMCP/1.0 (content analysis service)";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Build the HTTP client shared by the sources.
pub fn build_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .expect("Failed to build reqwest HTTP client")
}

/// HTTP access to a single upstream service.
#[derive(Clone)]
pub struct HttpSource {
    name: &'static str,
    client: reqwest::Client,
    base_url: String,
}

impl HttpSource {
    pub fn new(name: &'static str, client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            name,
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// `{base}/{segments...}` with each segment percent-encoded.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, UpstreamError> {
        join_segments(&self.base_url, segments)
            .map_err(|e| UpstreamError::protocol(self.name, format!("invalid base URL: {e}")))
    }

    /// `GET url` and decode the body as JSON.
    pub async fn get_json(
        &self,
        url: Url,
        query: &[(&str, String)],
        what: &str,
    ) -> Result<Value, UpstreamError> {
        let response = self.get(url, query, what).await?;
        response
            .json::<Value>()
            .await
            .map_err(|e| self.map_transport(e))
    }

    /// `GET url` and return the body as text.
    pub async fn get_text(
        &self,
        url: Url,
        query: &[(&str, String)],
        what: &str,
    ) -> Result<String, UpstreamError> {
        let response = self.get(url, query, what).await?;
        response.text().await.map_err(|e| self.map_transport(e))
    }

    async fn get(
        &self,
        url: Url,
        query: &[(&str, String)],
        what: &str,
    ) -> Result<reqwest::Response, UpstreamError> {
        tracing::debug!(source = self.name, %url, "Upstream request");
        let mut request = self.client.get(url);
        if !query.is_empty() {
            request = request.query(query);
        }
        let response = request.send().await.map_err(|e| self.map_transport(e))?;
        self.ensure_success(response, what).await
    }

    /// Classify a response status, passing successful responses through.
    pub async fn ensure_success(
        &self,
        response: reqwest::Response,
        what: &str,
    ) -> Result<reqwest::Response, UpstreamError> {
        let status = response.status();
        if status.is_success() && status != StatusCode::ACCEPTED {
            return Ok(response);
        }
        let retry_after = parse_retry_after(&response);
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        Err(classify_status(self.name, status, retry_after, &body, what))
    }

    pub fn map_transport(&self, err: reqwest::Error) -> UpstreamError {
        map_transport_error(self.name, err)
    }
}

/// Append percent-encoded path segments to `base`.
pub fn join_segments(base: &str, segments: &[&str]) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(base)?;
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    Ok(url)
}

/// Translate a reqwest error into the upstream taxonomy.
pub fn map_transport_error(source_name: &'static str, err: reqwest::Error) -> UpstreamError {
    if err.is_decode() {
        UpstreamError::protocol(source_name, format!("undecodable body: {err}"))
    } else if err.is_timeout() {
        UpstreamError::transient(source_name, "request timed out")
    } else {
        UpstreamError::transient(source_name, format!("request failed: {err}"))
    }
}

/// Translate a non-success status into the upstream taxonomy.
pub fn classify_status(
    source_name: &'static str,
    status: StatusCode,
    retry_after: Option<Duration>,
    body: &str,
    what: &str,
) -> UpstreamError {
    match status.as_u16() {
        404 => UpstreamError::not_found(source_name, what),
        202 => UpstreamError::TransientUnavailable {
            source_name,
            reason: "request queued upstream, try again shortly".into(),
            retry_after: retry_after.or(Some(Duration::from_secs(2))),
        },
        429 | 502 | 503 | 504 => UpstreamError::TransientUnavailable {
            source_name,
            reason: format!("HTTP {}", status.as_u16()),
            retry_after,
        },
        code => {
            let snippet: String = body.chars().take(200).collect();
            UpstreamError::protocol(source_name, format!("HTTP {code}: {snippet}"))
        }
    }
}

fn parse_retry_after(response: &reqwest::Response) -> Option<Duration> {
    response
        .headers()
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}
