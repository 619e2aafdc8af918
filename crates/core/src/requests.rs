//! Inbound analysis request bodies and their validation rules.
//!
//! Every body is a plain struct with explicit optional members. Each one has
//! a single `validate` function that enumerates exactly which fields are
//! required; handlers call it before touching the cache or the LLM backend.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::{ComparisonType, Genre};
use crate::error::CoreError;
use crate::fingerprint::Fingerprint;

/// Upper bound on free-text fields sent to the LLM backend.
pub const MAX_CONTENT_CHARS: usize = 100_000;

/// Fewest works a comparison accepts.
pub const MIN_COMPARED_WORKS: usize = 2;

/// Most works a comparison accepts.
pub const MAX_COMPARED_WORKS: usize = 5;

/// Default number of recommendations.
pub const DEFAULT_RECOMMENDATION_LIMIT: u32 = 5;

/// Largest number of recommendations a single request may ask for.
pub const MAX_RECOMMENDATION_LIMIT: u32 = 20;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn is_blank(value: Option<&str>) -> bool {
    value.map(str::trim).is_none_or(str::is_empty)
}

fn require_text(field: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::Validation(format!("{field} must not be empty")));
    }
    if value.chars().count() > MAX_CONTENT_CHARS {
        return Err(CoreError::Validation(format!(
            "{field} exceeds {MAX_CONTENT_CHARS} characters"
        )));
    }
    Ok(())
}

fn validate_year(year: Option<i32>) -> Result<(), CoreError> {
    match year {
        Some(y) if !(1..=9999).contains(&y) => Err(CoreError::Validation(format!(
            "year must be between 1 and 9999, got {y}"
        ))),
        _ => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// AnalysisRequest
// ---------------------------------------------------------------------------

/// Body of `POST /analyze/{genre}` and `POST /analyze/parallel/{genre}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    #[serde(default)]
    pub content: String,
    pub title: Option<String>,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub creator: Option<String>,
    pub system: Option<String>,
    pub source: Option<String>,
    pub edition: Option<String>,
    pub year: Option<i32>,
    pub model: Option<String>,
    #[serde(default)]
    pub force_refresh: bool,
}

impl AnalysisRequest {
    /// Validate the request for the given genre.
    ///
    /// - `content` is always required.
    /// - RPG analyses additionally require a `system` name.
    pub fn validate(&self, genre: Genre) -> Result<(), CoreError> {
        require_text("content", &self.content)?;
        validate_year(self.year)?;
        if genre == Genre::Rpg && is_blank(self.system.as_deref()) {
            return Err(CoreError::Validation(
                "system is required for RPG analysis".into(),
            ));
        }
        Ok(())
    }

    /// Add every request field that influences the analysis to a fingerprint.
    pub fn fingerprint_fields(&self, fp: Fingerprint) -> Fingerprint {
        fp.text("content", Some(&self.content))
            .text("title", self.title.as_deref())
            .text("author", self.author.as_deref())
            .text("publisher", self.publisher.as_deref())
            .text("creator", self.creator.as_deref())
            .text("system", self.system.as_deref())
            .text("source", self.source.as_deref())
            .text("edition", self.edition.as_deref())
            .number("year", self.year.map(i64::from))
    }

    /// Descriptive fields echoed back on the analysis result.
    pub fn descriptive_fields(&self) -> Map<String, Value> {
        let mut map = Map::new();
        let texts = [
            ("title", &self.title),
            ("author", &self.author),
            ("publisher", &self.publisher),
            ("creator", &self.creator),
            ("system", &self.system),
            ("source", &self.source),
            ("edition", &self.edition),
        ];
        for (name, value) in texts {
            if let Some(v) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                map.insert(name.to_string(), Value::String(v.to_string()));
            }
        }
        if let Some(year) = self.year {
            map.insert("year".to_string(), Value::from(year));
        }
        map
    }
}

// ---------------------------------------------------------------------------
// RecommendationRequest
// ---------------------------------------------------------------------------

/// Body of `POST /recommend/{genre}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecommendationRequest {
    #[serde(default)]
    pub based_on: String,
    pub limit: Option<u32>,
    pub model: Option<String>,
    #[serde(default)]
    pub force_refresh: bool,
}

impl RecommendationRequest {
    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_RECOMMENDATION_LIMIT)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        require_text("based_on", &self.based_on)?;
        let limit = self.limit();
        if !(1..=MAX_RECOMMENDATION_LIMIT).contains(&limit) {
            return Err(CoreError::Validation(format!(
                "limit must be between 1 and {MAX_RECOMMENDATION_LIMIT}, got {limit}"
            )));
        }
        Ok(())
    }

    pub fn fingerprint_fields(&self, fp: Fingerprint) -> Fingerprint {
        fp.text("based_on", Some(&self.based_on))
            .number("limit", Some(i64::from(self.limit())))
    }
}

// ---------------------------------------------------------------------------
// CharacterAnalysisRequest
// ---------------------------------------------------------------------------

/// Body of `POST /analyze/character`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CharacterAnalysisRequest {
    #[serde(default)]
    pub character_sheet: String,
    #[serde(default)]
    pub system: String,
    pub model: Option<String>,
    #[serde(default)]
    pub force_refresh: bool,
}

impl CharacterAnalysisRequest {
    pub fn validate(&self) -> Result<(), CoreError> {
        require_text("character_sheet", &self.character_sheet)?;
        if self.system.trim().is_empty() {
            return Err(CoreError::Validation(
                "system is required for character analysis".into(),
            ));
        }
        Ok(())
    }

    pub fn fingerprint_fields(&self, fp: Fingerprint) -> Fingerprint {
        fp.text("character_sheet", Some(&self.character_sheet))
            .text("system", Some(&self.system))
    }
}

// ---------------------------------------------------------------------------
// ComparisonRequest
// ---------------------------------------------------------------------------

/// One work taking part in a comparison.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkRef {
    pub title: Option<String>,
    pub author: Option<String>,
    pub year: Option<i32>,
    pub content: Option<String>,
}

impl WorkRef {
    pub fn title_or_untitled(&self) -> &str {
        self.title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or("Untitled")
    }
}

/// Body of `POST /compare/{type}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComparisonRequest {
    #[serde(default)]
    pub works: Vec<WorkRef>,
    /// Only consulted by `/compare/works`; the other routes fix the type.
    pub analysis_type: Option<String>,
    #[serde(default)]
    pub enhanced: bool,
    pub model: Option<String>,
    #[serde(default)]
    pub force_refresh: bool,
}

impl ComparisonRequest {
    /// Resolve the effective comparison type for a route.
    ///
    /// `/compare/works` honours an `analysis_type` in the body; every other
    /// route uses its own path type.
    pub fn resolve_type(&self, route: ComparisonType) -> Result<ComparisonType, CoreError> {
        match (route, self.analysis_type.as_deref().map(str::trim)) {
            (ComparisonType::Works, Some(t)) if !t.is_empty() => ComparisonType::parse(t),
            _ => Ok(route),
        }
    }

    /// Require 2..=5 works, each with a title and an author.
    pub fn validate(&self) -> Result<(), CoreError> {
        let count = self.works.len();
        if !(MIN_COMPARED_WORKS..=MAX_COMPARED_WORKS).contains(&count) {
            return Err(CoreError::Validation(format!(
                "comparison requires between {MIN_COMPARED_WORKS} and {MAX_COMPARED_WORKS} works, got {count}"
            )));
        }
        for (index, work) in self.works.iter().enumerate() {
            if is_blank(work.title.as_deref()) || is_blank(work.author.as_deref()) {
                return Err(CoreError::Validation(format!(
                    "works[{index}] must have both title and author"
                )));
            }
            if let Some(content) = &work.content {
                if content.chars().count() > MAX_CONTENT_CHARS {
                    return Err(CoreError::Validation(format!(
                        "works[{index}].content exceeds {MAX_CONTENT_CHARS} characters"
                    )));
                }
            }
            validate_year(work.year)?;
        }
        Ok(())
    }

    pub fn fingerprint_fields(&self, fp: Fingerprint) -> Fingerprint {
        let works = serde_json::to_value(&self.works).unwrap_or(Value::Null);
        fp.json("works", &works).flag("enhanced", self.enhanced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn work(title: &str, author: &str) -> WorkRef {
        WorkRef {
            title: Some(title.into()),
            author: Some(author.into()),
            ..Default::default()
        }
    }

    fn comparison(n: usize) -> ComparisonRequest {
        ComparisonRequest {
            works: (0..n).map(|i| work(&format!("Work {i}"), "Author")).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn analysis_requires_content() {
        let req = AnalysisRequest::default();
        assert!(req.validate(Genre::ScienceFiction).is_err());
    }

    #[test]
    fn rpg_analysis_requires_system() {
        let mut req = AnalysisRequest {
            content: "A dungeon crawl".into(),
            ..Default::default()
        };
        assert!(req.validate(Genre::Rpg).is_err());
        assert!(req.validate(Genre::Comics).is_ok());

        req.system = Some("D&D 5e".into());
        assert!(req.validate(Genre::Rpg).is_ok());
    }

    #[test]
    fn analysis_rejects_nonsense_year() {
        let req = AnalysisRequest {
            content: "x".into(),
            year: Some(0),
            ..Default::default()
        };
        assert!(req.validate(Genre::ScienceFiction).is_err());
    }

    #[test]
    fn descriptive_fields_skip_blank_values() {
        let req = AnalysisRequest {
            content: "x".into(),
            title: Some("Dune".into()),
            author: Some("  ".into()),
            year: Some(1965),
            ..Default::default()
        };
        let fields = req.descriptive_fields();
        assert_eq!(fields["title"], "Dune");
        assert_eq!(fields["year"], 1965);
        assert!(!fields.contains_key("author"));
    }

    #[test]
    fn comparison_accepts_two_to_five_works() {
        for n in 2..=5 {
            assert!(comparison(n).validate().is_ok(), "{n} works should be accepted");
        }
    }

    #[test]
    fn comparison_rejects_out_of_range_counts() {
        for n in [0, 1, 6, 7] {
            assert!(comparison(n).validate().is_err(), "{n} works should be rejected");
        }
    }

    #[test]
    fn comparison_requires_title_and_author_on_every_work() {
        let mut req = comparison(2);
        req.works[1].author = None;
        let err = req.validate().unwrap_err();
        assert!(err.to_string().contains("works[1]"));
    }

    #[test]
    fn works_route_honours_body_type() {
        let mut req = comparison(2);
        req.analysis_type = Some("plot".into());
        assert_eq!(
            req.resolve_type(ComparisonType::Works).unwrap(),
            ComparisonType::Plot
        );
        assert_eq!(
            req.resolve_type(ComparisonType::Themes).unwrap(),
            ComparisonType::Themes
        );
        req.analysis_type = Some("vibes".into());
        assert!(req.resolve_type(ComparisonType::Works).is_err());
    }

    #[test]
    fn recommendation_limit_defaults_and_bounds() {
        let mut req = RecommendationRequest {
            based_on: "Neuromancer".into(),
            ..Default::default()
        };
        assert_eq!(req.limit(), DEFAULT_RECOMMENDATION_LIMIT);
        assert!(req.validate().is_ok());
        req.limit = Some(0);
        assert!(req.validate().is_err());
        req.limit = Some(MAX_RECOMMENDATION_LIMIT + 1);
        assert!(req.validate().is_err());
    }

    #[test]
    fn character_request_requires_sheet_and_system() {
        let mut req = CharacterAnalysisRequest {
            character_sheet: "Fighter 3".into(),
            ..Default::default()
        };
        assert!(req.validate().is_err());
        req.system = "Pathfinder".into();
        assert!(req.validate().is_ok());
    }
}
