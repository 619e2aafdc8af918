//! Shared response envelope types for API handlers.
//!
//! Collection and lookup endpoints use a `{ "data": ..., "metadata": ... }`
//! envelope. Analysis endpoints return the analysis result itself with a
//! `metadata` object appended (see [`with_metadata`]).

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use sfmcp_core::types::Timestamp;

/// Metadata attached to every successful response.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseMetadata {
    pub timestamp: Timestamp,
    /// Which subsystem produced the payload (`openrouter`, a source name, `monitoring`, ...).
    pub source: String,
    pub cache_hit: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl ResponseMetadata {
    pub fn new(source: impl Into<String>, cache_hit: bool) -> Self {
        Self {
            timestamp: Utc::now(),
            source: source.into(),
            cache_hit,
            model: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// Standard `{ "data": T, "metadata": {...} }` response envelope.
///
/// # Example
///
/// ```ignore
/// Ok(Json(DataResponse::new(items, "monitoring")))
/// ```
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
    pub metadata: ResponseMetadata,
}

impl<T: Serialize> DataResponse<T> {
    /// Wrap a freshly computed (never cached) payload.
    pub fn new(data: T, source: impl Into<String>) -> Self {
        Self {
            data,
            metadata: ResponseMetadata::new(source, false),
        }
    }
}

/// Append `metadata` to an object payload. Non-object payloads are wrapped
/// as `{ "data": payload, "metadata": ... }`.
pub fn with_metadata(payload: Value, metadata: &ResponseMetadata) -> Value {
    let metadata = serde_json::to_value(metadata).unwrap_or(Value::Null);
    match payload {
        Value::Object(mut map) => {
            map.insert("metadata".into(), metadata);
            Value::Object(map)
        }
        other => serde_json::json!({ "data": other, "metadata": metadata }),
    }
}
