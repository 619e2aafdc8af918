//! Email notification delivery via SMTP.
//!
//! [`EmailDelivery`] wraps the `lettre` async SMTP transport to send
//! plain-text notification emails. The initial configuration is loaded from
//! environment variables; if `SMTP_HOST` is not set, [`EmailConfig::from_env`]
//! returns `None` and email delivery stays off until a configuration is
//! supplied through [`EmailDelivery::configure`].

use serde::{Deserialize, Serialize};
use sfmcp_core::error::CoreError;
use tokio::sync::RwLock;

use crate::bus::MonitoringEvent;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for email delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),
}

// ---------------------------------------------------------------------------
// EmailConfig
// ---------------------------------------------------------------------------

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Default sender address when `SMTP_FROM` is not set.
const DEFAULT_FROM_ADDRESS: &str = "noreply@sfmcp.local";

fn default_port() -> u16 {
    DEFAULT_SMTP_PORT
}

fn default_from() -> String {
    DEFAULT_FROM_ADDRESS.to_string()
}

/// SMTP settings plus the recipients of monitoring notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub smtp_host: String,
    #[serde(default = "default_port")]
    pub smtp_port: u16,
    /// RFC 5322 "From" address.
    #[serde(default = "default_from")]
    pub from_address: String,
    #[serde(default)]
    pub smtp_user: Option<String>,
    #[serde(default, skip_serializing)]
    pub smtp_password: Option<String>,
    #[serde(default)]
    pub recipients: Vec<String>,
}

impl EmailConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `SMTP_HOST` is not set.
    ///
    /// | Variable        | Required | Default                |
    /// |-----------------|----------|------------------------|
    /// | `SMTP_HOST`     | yes      |                        |
    /// | `SMTP_PORT`     | no       | `587`                  |
    /// | `SMTP_FROM`     | no       | `noreply@sfmcp.local`  |
    /// | `SMTP_USER`     | no       |                        |
    /// | `SMTP_PASSWORD` | no       |                        |
    /// | `SMTP_TO`       | no       | comma-separated list   |
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("SMTP_HOST").ok().filter(|h| !h.is_empty())?;
        Some(Self {
            smtp_host,
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address: std::env::var("SMTP_FROM").unwrap_or_else(|_| default_from()),
            smtp_user: std::env::var("SMTP_USER").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
            recipients: std::env::var("SMTP_TO")
                .map(|v| parse_recipients(&v))
                .unwrap_or_default(),
        })
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.smtp_host.trim().is_empty() {
            return Err(CoreError::Validation("smtp_host must not be empty".into()));
        }
        if self.smtp_port == 0 {
            return Err(CoreError::Validation("smtp_port must be non-zero".into()));
        }
        if self.recipients.is_empty() {
            return Err(CoreError::Validation(
                "recipients must list at least one address".into(),
            ));
        }
        for address in std::iter::once(&self.from_address).chain(&self.recipients) {
            address
                .parse::<lettre::Address>()
                .map_err(|_| CoreError::Validation(format!("Invalid email address '{address}'")))?;
        }
        Ok(())
    }
}

fn parse_recipients(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

// ---------------------------------------------------------------------------
// EmailDelivery
// ---------------------------------------------------------------------------

/// Sends notification emails via SMTP. The configuration can be replaced
/// at runtime.
pub struct EmailDelivery {
    config: RwLock<Option<EmailConfig>>,
}

impl EmailDelivery {
    pub fn new(config: Option<EmailConfig>) -> Self {
        Self {
            config: RwLock::new(config),
        }
    }

    pub async fn configure(&self, config: EmailConfig) {
        tracing::info!(
            smtp_host = %config.smtp_host,
            recipients = config.recipients.len(),
            "Email configuration updated"
        );
        *self.config.write().await = Some(config);
    }

    pub async fn is_configured(&self) -> bool {
        self.config.read().await.is_some()
    }

    pub async fn config(&self) -> Option<EmailConfig> {
        self.config.read().await.clone()
    }

    /// Send the event to every configured recipient. Returns how many
    /// messages were accepted by the SMTP server.
    pub async fn deliver_all(&self, event: &MonitoringEvent) -> usize {
        let Some(config) = self.config().await else {
            tracing::debug!(event_type = %event.event_type, "Email not configured, skipping");
            return 0;
        };
        let mut sent = 0;
        for to in &config.recipients {
            match send(&config, to, event).await {
                Ok(()) => sent += 1,
                Err(e) => {
                    tracing::error!(to = %to, error = %e, "Failed to send notification email")
                }
            }
        }
        sent
    }
}

/// Subject and plain-text body for an event.
fn render(event: &MonitoringEvent) -> (String, String) {
    let subject = match event.payload.get("profile_name").and_then(|v| v.as_str()) {
        Some(name) => format!("[SFMCP] {} ({name})", event.event_type),
        None => format!("[SFMCP] {}", event.event_type),
    };
    let mut body = format!("Event: {}\nTime: {}\n", event.event_type, event.timestamp);
    if let Some(items) = event.payload.get("items").and_then(|v| v.as_array()) {
        body.push_str(&format!("\n{} new item(s):\n", items.len()));
        for item in items {
            let title = item.get("title").and_then(|v| v.as_str()).unwrap_or("(untitled)");
            let source = item.get("source").and_then(|v| v.as_str()).unwrap_or("?");
            body.push_str(&format!("- [{source}] {title}"));
            if let Some(url) = item.get("url").and_then(|v| v.as_str()) {
                body.push_str(&format!(" <{url}>"));
            }
            body.push('\n');
        }
    } else {
        body.push_str(&format!(
            "Details: {}\n",
            serde_json::to_string_pretty(&event.payload).unwrap_or_default()
        ));
    }
    (subject, body)
}

async fn send(config: &EmailConfig, to_email: &str, event: &MonitoringEvent) -> Result<(), EmailError> {
    use lettre::{
        message::header::ContentType, transport::smtp::authentication::Credentials,
        AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    };

    let (subject, body) = render(event);

    let email = Message::builder()
        .from(config.from_address.parse()?)
        .to(to_email.parse()?)
        .subject(subject)
        .header(ContentType::TEXT_PLAIN)
        .body(body)
        .map_err(|e| EmailError::Build(e.to_string()))?;

    let mut transport_builder =
        AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port);

    if let (Some(user), Some(pass)) = (&config.smtp_user, &config.smtp_password) {
        transport_builder =
            transport_builder.credentials(Credentials::new(user.clone(), pass.clone()));
    }

    let mailer = transport_builder.build();
    mailer.send(email).await?;

    tracing::info!(to = to_email, event_type = %event.event_type, "Notification email sent");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
