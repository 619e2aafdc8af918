use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::header::RETRY_AFTER;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::{json, Value};
use sfmcp_core::error::CoreError;
use sfmcp_store::StoreError;
use sfmcp_upstream::UpstreamError;

/// `Retry-After` sent with a 503 when the upstream gave no hint.
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Application-level error type for HTTP handlers.
///
/// Wraps the library error enums and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce the `{error, exists, details}`
/// envelope every failure is reported in.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `sfmcp_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A failure talking to a source or the LLM router.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// A cache or repository backend failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The request did not complete within the configured timeout.
    #[error("Request timed out")]
    Timeout,

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

fn internal() -> (StatusCode, &'static str, String, Value) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
        json!({}),
    )
}

fn upstream_source(err: &UpstreamError) -> Option<&'static str> {
    match err {
        UpstreamError::NotFound { source_name, .. }
        | UpstreamError::TransientUnavailable { source_name, .. }
        | UpstreamError::Protocol { source_name, .. }
        | UpstreamError::UnsupportedOperation { source_name, .. } => Some(*source_name),
        _ => None,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut retry_after = None;

        let (status, code, message, mut details) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                    json!({}),
                ),
                CoreError::NotFoundKey { entity, key } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} '{key}' not found"),
                    json!({}),
                ),
                CoreError::Validation(msg) => (
                    StatusCode::BAD_REQUEST,
                    "VALIDATION_ERROR",
                    msg.clone(),
                    json!({}),
                ),
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    internal()
                }
            },

            // --- Upstream errors ---
            AppError::Upstream(err) => {
                let source = upstream_source(err);
                match err {
                    UpstreamError::NotFound { .. } => (
                        StatusCode::NOT_FOUND,
                        "NOT_FOUND",
                        err.to_string(),
                        json!({ "source": source }),
                    ),
                    UpstreamError::TransientUnavailable { .. } => {
                        let secs = err
                            .retry_after()
                            .map(|d| d.as_secs().max(1))
                            .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
                        retry_after = Some(secs);
                        tracing::warn!(error = %err, "Upstream temporarily unavailable");
                        (
                            StatusCode::SERVICE_UNAVAILABLE,
                            "UPSTREAM_UNAVAILABLE",
                            err.to_string(),
                            json!({
                                "source": source,
                                "retryable": true,
                                "retry_after_secs": secs,
                            }),
                        )
                    }
                    UpstreamError::Protocol { .. } => {
                        tracing::error!(error = %err, "Upstream protocol error");
                        (
                            StatusCode::BAD_GATEWAY,
                            "UPSTREAM_PROTOCOL_ERROR",
                            "The upstream service returned an invalid response".to_string(),
                            json!({ "source": source, "retryable": false }),
                        )
                    }
                    UpstreamError::NotConfigured(_) => (
                        StatusCode::SERVICE_UNAVAILABLE,
                        "NOT_CONFIGURED",
                        err.to_string(),
                        json!({ "retryable": false }),
                    ),
                    UpstreamError::UnknownSource(_) | UpstreamError::UnsupportedOperation { .. } => (
                        StatusCode::NOT_FOUND,
                        "UNKNOWN_OPERATION",
                        err.to_string(),
                        json!({ "source": source }),
                    ),
                    UpstreamError::InvalidParameter(msg) => (
                        StatusCode::BAD_REQUEST,
                        "VALIDATION_ERROR",
                        msg.clone(),
                        json!({}),
                    ),
                }
            }

            // --- Store errors ---
            AppError::Store(err) => {
                tracing::error!(error = %err, "Store error");
                internal()
            }

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                "BAD_REQUEST",
                msg.clone(),
                json!({}),
            ),
            AppError::Timeout => (
                StatusCode::REQUEST_TIMEOUT,
                "REQUEST_TIMEOUT",
                self.to_string(),
                json!({ "retryable": true }),
            ),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                internal()
            }
        };

        if let Some(obj) = details.as_object_mut() {
            obj.insert("code".into(), Value::from(code));
        }

        let body = json!({
            "error": message,
            "exists": false,
            "details": details,
        });

        let mut response = (status, axum::Json(body)).into_response();
        if let Some(secs) = retry_after {
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}
