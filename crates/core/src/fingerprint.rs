//! Deterministic request fingerprints used as cache keys.
//!
//! A fingerprint is built from a namespace (e.g. `analyze:sf`,
//! `source:wikipedia:summary`) plus named request fields. Fields are kept in
//! a sorted map, string values are trimmed, and absent or blank fields are
//! dropped, so two requests that differ only in field order or surrounding
//! whitespace produce the same key.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::hashing::sha256_hex;

/// An opaque cache key: `"{namespace}:{sha256 of canonical fields}"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The namespace portion of the key (everything before the digest).
    pub fn namespace(&self) -> &str {
        self.0.rsplit_once(':').map(|(ns, _)| ns).unwrap_or("")
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Builder for a [`CacheKey`].
#[derive(Debug, Clone)]
pub struct Fingerprint {
    namespace: String,
    fields: BTreeMap<String, Value>,
}

impl Fingerprint {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Add an optional string field. Blank values are treated as absent.
    pub fn text(mut self, name: &str, value: Option<&str>) -> Self {
        if let Some(v) = value.map(str::trim).filter(|v| !v.is_empty()) {
            self.fields.insert(name.to_string(), Value::String(v.to_string()));
        }
        self
    }

    /// Add an optional integer field.
    pub fn number(mut self, name: &str, value: Option<i64>) -> Self {
        if let Some(v) = value {
            self.fields.insert(name.to_string(), Value::from(v));
        }
        self
    }

    /// Add a boolean flag. `false` is treated as absent.
    pub fn flag(mut self, name: &str, value: bool) -> Self {
        if value {
            self.fields.insert(name.to_string(), Value::Bool(true));
        }
        self
    }

    /// Add an arbitrary JSON value, normalized recursively.
    pub fn json(mut self, name: &str, value: &Value) -> Self {
        if let Some(v) = normalize(value) {
            self.fields.insert(name.to_string(), v);
        }
        self
    }

    /// Produce the final key.
    pub fn finish(self) -> CacheKey {
        // BTreeMap serializes in key order; serde_json::Map is also sorted,
        // so nested objects are canonical too.
        let canonical = serde_json::to_string(&self.fields).unwrap_or_default();
        CacheKey(format!("{}:{}", self.namespace, sha256_hex(canonical.as_bytes())))
    }
}

/// Trim strings and drop nulls / blank strings, recursively.
fn normalize(value: &Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| Value::String(trimmed.to_string()))
        }
        Value::Array(items) => Some(Value::Array(
            items
                .iter()
                .map(|v| normalize(v).unwrap_or(Value::Null))
                .collect(),
        )),
        Value::Object(map) => Some(Value::Object(
            map.iter()
                .filter_map(|(k, v)| normalize(v).map(|v| (k.clone(), v)))
                .collect(),
        )),
        other => Some(other.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn field_order_does_not_change_key() {
        let a = Fingerprint::new("analyze:sf")
            .text("title", Some("Dune"))
            .text("author", Some("Frank Herbert"))
            .finish();
        let b = Fingerprint::new("analyze:sf")
            .text("author", Some("Frank Herbert"))
            .text("title", Some("Dune"))
            .finish();
        assert_eq!(a, b);
    }

    #[test]
    fn surrounding_whitespace_and_blank_fields_are_ignored() {
        let a = Fingerprint::new("ns")
            .text("title", Some("  Dune "))
            .text("publisher", Some("   "))
            .finish();
        let b = Fingerprint::new("ns").text("title", Some("Dune")).finish();
        assert_eq!(a, b);
    }

    #[test]
    fn model_changes_key() {
        let a = Fingerprint::new("ns").text("model", Some("m1")).finish();
        let b = Fingerprint::new("ns").text("model", Some("m2")).finish();
        assert_ne!(a, b);
    }

    #[test]
    fn namespace_is_part_of_key() {
        let a = Fingerprint::new("analyze:sf").text("content", Some("x")).finish();
        let b = Fingerprint::new("analyze:comics").text("content", Some("x")).finish();
        assert_ne!(a, b);
        assert_eq!(a.namespace(), "analyze:sf");
    }

    #[test]
    fn json_fields_are_normalized_recursively() {
        let a = Fingerprint::new("ns")
            .json("params", &json!({"b": " x ", "a": null, "c": [" y"]}))
            .finish();
        let b = Fingerprint::new("ns")
            .json("params", &json!({"c": ["y"], "b": "x"}))
            .finish();
        assert_eq!(a, b);
    }
}
