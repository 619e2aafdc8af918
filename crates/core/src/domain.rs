//! Content domains understood by the analysis endpoints.
//!
//! Path segments such as `/analyze/{genre}` and `/compare/{type}` are parsed
//! into these closed enums once, at the edge, so the rest of the system never
//! branches on raw strings.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A content genre with its own analysis and recommendation prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Genre {
    #[serde(rename = "sf")]
    ScienceFiction,
    #[serde(rename = "comics")]
    Comics,
    #[serde(rename = "rpg")]
    Rpg,
}

impl Genre {
    pub const ALL: [Genre; 3] = [Genre::ScienceFiction, Genre::Comics, Genre::Rpg];

    /// Short tag used in URLs, cache keys and result `type` fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ScienceFiction => "sf",
            Self::Comics => "comics",
            Self::Rpg => "rpg",
        }
    }

    /// Parse a path segment into a genre.
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            "sf" => Ok(Self::ScienceFiction),
            "comics" => Ok(Self::Comics),
            "rpg" => Ok(Self::Rpg),
            other => Err(CoreError::Validation(format!(
                "unknown genre '{other}', expected one of: sf, comics, rpg"
            ))),
        }
    }

    /// The result tag produced by analyses in this genre.
    pub fn result_type(&self) -> ResultType {
        match self {
            Self::ScienceFiction => ResultType::Sf,
            Self::Comics => ResultType::Comics,
            Self::Rpg => ResultType::Rpg,
        }
    }
}

impl std::fmt::Display for Genre {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The aspect compared across works by `/compare/{type}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonType {
    Works,
    Themes,
    WorldBuilding,
    Characters,
    Plot,
}

impl ComparisonType {
    pub const ALL: [ComparisonType; 5] = [
        ComparisonType::Works,
        ComparisonType::Themes,
        ComparisonType::WorldBuilding,
        ComparisonType::Characters,
        ComparisonType::Plot,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Works => "works",
            Self::Themes => "themes",
            Self::WorldBuilding => "world_building",
            Self::Characters => "characters",
            Self::Plot => "plot",
        }
    }

    pub fn parse(value: &str) -> Result<Self, CoreError> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == value)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "unknown comparison type '{value}', expected one of: works, themes, \
                     world_building, characters, plot"
                ))
            })
    }

    /// One-line description served by `GET /compare/types`.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Works => "Overall comparison of the works",
            Self::Themes => "Themes, motifs and symbolism",
            Self::WorldBuilding => "Setting, cultures, technology and magic systems",
            Self::Characters => "Character arcs, relationships and archetypes",
            Self::Plot => "Plot structure, pacing and narrative technique",
        }
    }
}

impl std::fmt::Display for ComparisonType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type tag carried by every analysis result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultType {
    Sf,
    Comics,
    Rpg,
    Character,
    Comparative,
}
