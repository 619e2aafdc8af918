//! OpenRouter chat-completions client.
//!
//! Configuration is read from environment variables:
//!
//! | Variable                   | Default                          |
//! |----------------------------|----------------------------------|
//! | `OPENROUTER_API_KEY`       | (none, analysis calls fail)      |
//! | `OPENROUTER_BASE_URL`      | `https://openrouter.ai/api/v1`   |
//! | `OPENROUTER_DEFAULT_MODEL` | `mistralai/mistral-7b`           |
//! | `OPENROUTER_FORCE_MODEL`   | `false`                          |

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sfmcp_core::prompts::Prompt;

use crate::error::UpstreamError;
use crate::http::{build_client, map_transport_error, DEFAULT_TIMEOUT};

const NAME: &str = "openrouter";

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "mistralai/mistral-7b";
pub const TEMPERATURE: f64 = 0.7;
pub const MAX_TOKENS: u32 = 1000;

const REFERER: &str = "https://github.com/sfmcp/sfmcp";
const TITLE: &str = "SFMCP Analysis";

/// A finished completion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LlmCompletion {
    pub content: String,
    pub model: String,
    pub usage: Option<Value>,
    pub finish_reason: Option<String>,
}

/// Backend that turns a prompt into text.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// The model a request will actually use.
    fn resolve_model(&self, requested: Option<&str>) -> String;

    async fn complete(&self, prompt: &Prompt, model: &str) -> Result<LlmCompletion, UpstreamError>;
}

#[derive(Debug, Clone)]
pub struct OpenRouterConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub default_model: String,
    pub force_model: bool,
    pub timeout: Duration,
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            force_model: false,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl OpenRouterConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: std::env::var("OPENROUTER_API_KEY").ok().filter(|k| !k.is_empty()),
            base_url: std::env::var("OPENROUTER_BASE_URL").unwrap_or(defaults.base_url),
            default_model: std::env::var("OPENROUTER_DEFAULT_MODEL")
                .ok()
                .filter(|m| !m.is_empty())
                .unwrap_or(defaults.default_model),
            force_model: std::env::var("OPENROUTER_FORCE_MODEL")
                .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            timeout: std::env::var("UPSTREAM_TIMEOUT_SECS")
                .ok()
                .map(|v| {
                    v.parse::<u64>()
                        .expect("UPSTREAM_TIMEOUT_SECS must be a valid u64")
                })
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        }
    }
}

pub struct OpenRouterClient {
    client: reqwest::Client,
    config: OpenRouterConfig,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Value>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenRouterClient {
    pub fn new(config: OpenRouterConfig) -> Self {
        Self {
            client: build_client(config.timeout),
            config,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    pub fn default_model(&self) -> &str {
        &self.config.default_model
    }
}

#[async_trait]
impl LlmClient for OpenRouterClient {
    fn resolve_model(&self, requested: Option<&str>) -> String {
        match requested.map(str::trim).filter(|m| !m.is_empty()) {
            Some(m) if !self.config.force_model => m.to_string(),
            _ => self.config.default_model.clone(),
        }
    }

    async fn complete(&self, prompt: &Prompt, model: &str) -> Result<LlmCompletion, UpstreamError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(UpstreamError::NotConfigured("OpenRouter API key"))?;
        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let body = json!({
            "model": model,
            "messages": [
                {"role": "system", "content": prompt.system},
                {"role": "user", "content": prompt.user},
            ],
            "temperature": TEMPERATURE,
            "max_tokens": MAX_TOKENS,
        });

        tracing::debug!(%model, "Requesting completion");
        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .header("HTTP-Referer", REFERER)
            .header("X-Title", TITLE)
            .json(&body)
            .send()
            .await
            .map_err(|e| map_transport_error(NAME, e))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            let text = response.text().await.unwrap_or_default();
            return Err(classify_llm_status(status, retry_after, &text));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| map_transport_error(NAME, e))?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| UpstreamError::protocol(NAME, "completion has no choices"))?;
        let content = choice
            .message
            .and_then(|m| m.content)
            .ok_or_else(|| UpstreamError::protocol(NAME, "completion has no message content"))?;

        Ok(LlmCompletion {
            content,
            model: parsed.model.unwrap_or_else(|| model.to_string()),
            usage: parsed.usage,
            finish_reason: choice.finish_reason,
        })
    }
}

fn classify_llm_status(status: StatusCode, retry_after: Option<Duration>, body: &str) -> UpstreamError {
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        UpstreamError::TransientUnavailable {
            source_name: NAME,
            reason: format!("HTTP {}", status.as_u16()),
            retry_after,
        }
    } else {
        let snippet: String = body.chars().take(200).collect();
        UpstreamError::protocol(NAME, format!("HTTP {}: {snippet}", status.as_u16()))
    }
}
