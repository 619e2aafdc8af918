//! Key-level comparison of two JSON results.
//!
//! Used by the parallel harness to diff the output of the original and the
//! enhanced ("mcp") pipelines. Objects are flattened into dotted paths
//! (`analysis.usage.total_tokens`); arrays and scalars compare as whole values.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The status of a single key in a comparison.
///
/// - `Added`     -- present only on the mcp side.
/// - `Removed`   -- present only on the original side.
/// - `Changed`   -- present on both sides with different values.
/// - `Unchanged` -- present on both sides with identical values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffStatus {
    Added,
    Removed,
    Changed,
    Unchanged,
}

impl DiffStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Removed => "removed",
            Self::Changed => "changed",
            Self::Unchanged => "unchanged",
        }
    }
}

impl std::fmt::Display for DiffStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One differing key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyDifference {
    pub key: String,
    pub status: DiffStatus,
    pub original: Option<Value>,
    pub mcp: Option<Value>,
}

/// Result of [`compare_results`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultComparison {
    pub identical: bool,
    pub differences: Vec<KeyDifference>,
    pub original_keys: Vec<String>,
    pub mcp_keys: Vec<String>,
    pub common_keys: Vec<String>,
    pub missing_in_original: Vec<String>,
    pub missing_in_mcp: Vec<String>,
}

impl ResultComparison {
    /// Short human-readable summary, suitable for logs.
    pub fn summary(&self) -> String {
        if self.identical {
            return format!("results identical across {} keys", self.common_keys.len());
        }
        format!(
            "{} differences ({} common keys, {} only in original, {} only in mcp)",
            self.differences.len(),
            self.common_keys.len(),
            self.missing_in_mcp.len(),
            self.missing_in_original.len(),
        )
    }
}

fn flatten(prefix: &str, value: &Value, out: &mut BTreeMap<String, Value>) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (k, v) in map {
                let path = if prefix.is_empty() {
                    k.clone()
                } else {
                    format!("{prefix}.{k}")
                };
                flatten(&path, v, out);
            }
        }
        other => {
            out.insert(prefix.to_string(), other.clone());
        }
    }
}

fn flattened(value: &Value) -> BTreeMap<String, Value> {
    let mut out = BTreeMap::new();
    flatten("", value, &mut out);
    out
}

/// Compare two results key by key.
///
/// Keys come out sorted. Differences list changed keys first, in key order,
/// then keys missing from one side.
pub fn compare_results(original: &Value, mcp: &Value) -> ResultComparison {
    let left = flattened(original);
    let right = flattened(mcp);

    let mut differences = Vec::new();
    let mut common_keys = Vec::new();
    let mut missing_in_mcp = Vec::new();
    let mut missing_in_original = Vec::new();

    for (key, lv) in &left {
        match right.get(key) {
            Some(rv) => {
                common_keys.push(key.clone());
                if lv != rv {
                    differences.push(KeyDifference {
                        key: key.clone(),
                        status: DiffStatus::Changed,
                        original: Some(lv.clone()),
                        mcp: Some(rv.clone()),
                    });
                }
            }
            None => missing_in_mcp.push(key.clone()),
        }
    }
    for key in right.keys() {
        if !left.contains_key(key) {
            missing_in_original.push(key.clone());
        }
    }

    differences.extend(missing_in_mcp.iter().map(|key| KeyDifference {
        key: key.clone(),
        status: DiffStatus::Removed,
        original: left.get(key).cloned(),
        mcp: None,
    }));
    differences.extend(missing_in_original.iter().map(|key| KeyDifference {
        key: key.clone(),
        status: DiffStatus::Added,
        original: None,
        mcp: right.get(key).cloned(),
    }));

    ResultComparison {
        identical: differences.is_empty(),
        differences,
        original_keys: left.into_keys().collect(),
        mcp_keys: right.into_keys().collect(),
        common_keys,
        missing_in_original,
        missing_in_mcp,
    }
}
