//! Visualization request types and data-shape validation.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;

/// Only output format the bundled renderer produces.
pub const FORMAT_SVG: &str = "svg";

/// Upper bound on nodes, events or series entries per chart.
pub const MAX_CHART_ELEMENTS: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisualizationType {
    Network,
    Temporal,
    Comparative,
}

impl VisualizationType {
    pub const ALL: [VisualizationType; 3] = [Self::Network, Self::Temporal, Self::Comparative];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Temporal => "temporal",
            Self::Comparative => "comparative",
        }
    }

    pub fn parse(value: &str) -> Result<Self, CoreError> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == value)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "unknown visualization type '{value}', expected one of: network, temporal, comparative"
                ))
            })
    }

    /// Top-level fields the `data` object must carry.
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            Self::Network => &["nodes", "edges"],
            Self::Temporal => &["events"],
            Self::Comparative => &["series"],
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Network => "Character or work relationship graph",
            Self::Temporal => "Events plotted along a timeline",
            Self::Comparative => "Side-by-side bar chart of named values",
        }
    }
}

/// Body of `POST /visualize`.
#[derive(Debug, Clone, Deserialize)]
pub struct VisualizationRequest {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Value,
    pub format: Option<String>,
}

// ---------------------------------------------------------------------------
// Typed chart data
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NetworkNode {
    pub id: String,
    pub label: Option<String>,
    pub group: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NetworkEdge {
    pub source: String,
    pub target: String,
    pub weight: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TimelineEvent {
    pub year: i32,
    pub label: String,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SeriesEntry {
    pub name: String,
    pub value: f64,
}

/// Chart data after shape validation.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartData {
    Network {
        nodes: Vec<NetworkNode>,
        edges: Vec<NetworkEdge>,
    },
    Temporal {
        events: Vec<TimelineEvent>,
    },
    Comparative {
        series: Vec<SeriesEntry>,
    },
}

fn field<T: serde::de::DeserializeOwned>(data: &Value, name: &str) -> Result<T, CoreError> {
    let raw = data
        .get(name)
        .ok_or_else(|| CoreError::Validation(format!("data.{name} is required")))?;
    serde_json::from_value(raw.clone())
        .map_err(|e| CoreError::Validation(format!("data.{name} is malformed: {e}")))
}

fn check_len(name: &str, len: usize) -> Result<(), CoreError> {
    if len == 0 {
        return Err(CoreError::Validation(format!("data.{name} must not be empty")));
    }
    if len > MAX_CHART_ELEMENTS {
        return Err(CoreError::Validation(format!(
            "data.{name} exceeds {MAX_CHART_ELEMENTS} entries"
        )));
    }
    Ok(())
}

/// Validate the output format. `None` selects SVG.
pub fn validate_format(format: Option<&str>) -> Result<&'static str, CoreError> {
    match format.map(str::trim) {
        None | Some("") | Some(FORMAT_SVG) => Ok(FORMAT_SVG),
        Some(other) => Err(CoreError::Validation(format!(
            "unsupported visualization format '{other}', expected: svg"
        ))),
    }
}

/// Parse and validate the data object for a chart type.
pub fn parse_chart_data(kind: VisualizationType, data: &Value) -> Result<ChartData, CoreError> {
    if !data.is_object() {
        return Err(CoreError::Validation("data must be an object".into()));
    }
    match kind {
        VisualizationType::Network => {
            let nodes: Vec<NetworkNode> = field(data, "nodes")?;
            let edges: Vec<NetworkEdge> = field(data, "edges")?;
            check_len("nodes", nodes.len())?;
            let ids: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
            if ids.len() != nodes.len() {
                return Err(CoreError::Validation("data.nodes contains duplicate ids".into()));
            }
            if let Some(edge) = edges
                .iter()
                .find(|e| !ids.contains(e.source.as_str()) || !ids.contains(e.target.as_str()))
            {
                return Err(CoreError::Validation(format!(
                    "edge {} -> {} references an unknown node",
                    edge.source, edge.target
                )));
            }
            Ok(ChartData::Network { nodes, edges })
        }
        VisualizationType::Temporal => {
            let mut events: Vec<TimelineEvent> = field(data, "events")?;
            check_len("events", events.len())?;
            events.sort_by_key(|e| e.year);
            Ok(ChartData::Temporal { events })
        }
        VisualizationType::Comparative => {
            let series: Vec<SeriesEntry> = field(data, "series")?;
            check_len("series", series.len())?;
            if series.iter().any(|s| !s.value.is_finite()) {
                return Err(CoreError::Validation("data.series values must be finite".into()));
            }
            Ok(ChartData::Comparative { series })
        }
    }
}
