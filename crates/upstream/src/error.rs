use std::time::Duration;

/// Errors from an upstream source or the LLM router.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// The upstream reported no match. Common and not fatal.
    #[error("{source_name} has no match for {what}")]
    NotFound {
        source_name: &'static str,
        what: String,
    },

    /// Rate-limited, briefly down, timed out or unreachable.
    #[error("{source_name} is temporarily unavailable: {reason}")]
    TransientUnavailable {
        source_name: &'static str,
        reason: String,
        retry_after: Option<Duration>,
    },

    /// The upstream answered with something we cannot interpret.
    #[error("{source_name} returned an unexpected response: {detail}")]
    Protocol {
        source_name: &'static str,
        detail: String,
    },

    #[error("Source '{source_name}' does not support operation '{operation}'")]
    UnsupportedOperation {
        source_name: &'static str,
        operation: String,
    },

    /// A credential the source needs is missing from the configuration.
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("Unknown source '{0}'")]
    UnknownSource(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl UpstreamError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientUnavailable { .. })
    }

    /// Server-provided retry hint, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::TransientUnavailable { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// Local validation failures that never reached the network.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedOperation { .. } | Self::UnknownSource(_) | Self::InvalidParameter(_)
        )
    }

    pub(crate) fn transient(source_name: &'static str, reason: impl Into<String>) -> Self {
        Self::TransientUnavailable {
            source_name,
            reason: reason.into(),
            retry_after: None,
        }
    }

    pub(crate) fn protocol(source_name: &'static str, detail: impl Into<String>) -> Self {
        Self::Protocol {
            source_name,
            detail: detail.into(),
        }
    }

    pub(crate) fn not_found(source_name: &'static str, what: impl Into<String>) -> Self {
        Self::NotFound {
            source_name,
            what: what.into(),
        }
    }
}
