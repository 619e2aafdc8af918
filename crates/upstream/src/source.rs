//! The [`DataSource`] trait and parameter helpers shared by every source.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use sfmcp_core::monitoring::SourceItem;

use crate::error::UpstreamError;

/// An operation exposed by a source at `POST /{source}/{operation}`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Operation {
    pub name: &'static str,
    pub description: &'static str,
    pub required: &'static [&'static str],
    pub optional: &'static [&'static str],
}

/// A term a monitoring check asks a source about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorQuery {
    Keyword(String),
    Author(String),
}

/// A third-party bibliographic or media database.
#[async_trait]
pub trait DataSource: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn operations(&self) -> &'static [Operation];

    /// Run one operation and return its normalized payload.
    async fn fetch(&self, operation: &str, params: &Value) -> Result<Value, UpstreamError>;

    /// Items matching a monitoring term. Sources that cannot answer a given
    /// kind of query return an empty list.
    async fn find_items(&self, query: &MonitorQuery) -> Result<Vec<SourceItem>, UpstreamError> {
        let _ = query;
        Ok(Vec::new())
    }

    fn operation(&self, name: &str) -> Option<&'static Operation> {
        self.operations().iter().find(|op| op.name == name)
    }

    fn unsupported(&self, operation: &str) -> UpstreamError {
        UpstreamError::UnsupportedOperation {
            source_name: self.name(),
            operation: operation.to_string(),
        }
    }
}

/// Typed access to a JSON parameter object.
pub struct Params<'a> {
    value: &'a Value,
}

impl<'a> Params<'a> {
    pub fn new(value: &'a Value) -> Self {
        Self { value }
    }

    /// A trimmed, non-empty string parameter. Numbers are accepted and
    /// rendered as strings so `{"id": 123}` and `{"id": "123"}` agree.
    pub fn str(&self, name: &str) -> Option<String> {
        match self.value.get(name)? {
            Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn required(&self, name: &str) -> Result<String, UpstreamError> {
        self.str(name)
            .ok_or_else(|| UpstreamError::InvalidParameter(format!("'{name}' is required")))
    }

    /// A result-count parameter clamped to `1..=max`.
    pub fn limit(&self, default: u32, max: u32) -> Result<u32, UpstreamError> {
        match self.value.get("limit") {
            None | Some(Value::Null) => Ok(default),
            Some(v) => v
                .as_u64()
                .filter(|n| (1..=u64::from(max)).contains(n))
                .map(|n| n as u32)
                .ok_or_else(|| {
                    UpstreamError::InvalidParameter(format!("'limit' must be between 1 and {max}"))
                }),
        }
    }
}

/// Check that every required parameter of `op` is present.
pub fn check_required(op: &Operation, params: &Value) -> Result<(), UpstreamError> {
    if !params.is_object() && !params.is_null() {
        return Err(UpstreamError::InvalidParameter(
            "parameters must be a JSON object".into(),
        ));
    }
    let p = Params::new(params);
    for name in op.required {
        p.required(name)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn str_accepts_numbers_and_trims() {
        let params = json!({"id": 42, "name": "  Dune ", "blank": " "});
        let p = Params::new(&params);
        assert_eq!(p.str("id").as_deref(), Some("42"));
        assert_eq!(p.str("name").as_deref(), Some("Dune"));
        assert!(p.str("blank").is_none());
        assert!(p.required("missing").is_err());
    }

    #[test]
    fn limit_defaults_and_bounds() {
        assert_eq!(Params::new(&json!({})).limit(5, 20).unwrap(), 5);
        assert_eq!(Params::new(&json!({"limit": 3})).limit(5, 20).unwrap(), 3);
        assert!(Params::new(&json!({"limit": 0})).limit(5, 20).is_err());
        assert!(Params::new(&json!({"limit": 21})).limit(5, 20).is_err());
    }

    #[test]
    fn required_params_are_checked() {
        let op = Operation {
            name: "book",
            description: "",
            required: &["isbn"],
            optional: &[],
        };
        assert!(check_required(&op, &json!({"isbn": "123"})).is_ok());
        assert!(check_required(&op, &json!({})).is_err());
        assert!(check_required(&op, &json!([1])).is_err());
    }
}
