//! The two analysis pipelines compared by the parallel harness.
//!
//! [`Pipeline::Original`] is what `POST /analyze/{genre}` runs.
//! [`Pipeline::Mcp`] uses the enhanced system prompt, embeds the work's
//! title, author and year in the prompt, and tags its results with
//! `mcp_version` and `analysis_depth`. The two are cached under separate
//! namespaces.

use serde_json::{Map, Value};
use sfmcp_core::domain::Genre;
use sfmcp_core::fingerprint::Fingerprint;
use sfmcp_core::prompts::{analysis_prompt, enhanced_analysis_prompt};
use sfmcp_core::requests::AnalysisRequest;

use crate::engine::dispatcher::{AnalysisDispatcher, AnalysisJob, Dispatched};
use crate::error::AppResult;

pub const MCP_VERSION: &str = "1.0";
pub const ENHANCED_DEPTH: &str = "enhanced";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pipeline {
    Original,
    Mcp,
}

impl Pipeline {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::Mcp => "mcp",
        }
    }

    /// Build the dispatcher job for a validated request.
    pub fn job(&self, genre: Genre, request: &AnalysisRequest) -> AnalysisJob {
        let (namespace, prompt) = match self {
            Self::Original => (format!("analyze:{genre}"), analysis_prompt(genre, request)),
            Self::Mcp => (
                format!("analyze:{genre}:mcp"),
                enhanced_analysis_prompt(genre, request),
            ),
        };

        let mut extra: Map<String, Value> = request.descriptive_fields();
        if *self == Self::Mcp {
            extra.insert("mcp_version".into(), Value::from(MCP_VERSION));
            extra.insert("analysis_depth".into(), Value::from(ENHANCED_DEPTH));
        }

        AnalysisJob::new(
            request.fingerprint_fields(Fingerprint::new(namespace)),
            prompt,
            genre.result_type(),
        )
        .model(request.model.clone())
        .force_refresh(request.force_refresh)
        .extra(extra)
    }

    pub async fn run(
        &self,
        dispatcher: &AnalysisDispatcher,
        genre: Genre,
        request: &AnalysisRequest,
    ) -> AppResult<Dispatched> {
        dispatcher.dispatch(self.job(genre, request)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> AnalysisRequest {
        AnalysisRequest {
            content: "The spice must flow".into(),
            title: Some("Dune".into()),
            author: Some("Frank Herbert".into()),
            year: Some(1965),
            ..Default::default()
        }
    }

    #[test]
    fn pipelines_use_separate_cache_namespaces() {
        let original = Pipeline::Original.job(Genre::ScienceFiction, &request());
        let mcp = Pipeline::Mcp.job(Genre::ScienceFiction, &request());
        assert_eq!(original.fingerprint.clone().finish().namespace(), "analyze:sf");
        assert_eq!(mcp.fingerprint.clone().finish().namespace(), "analyze:sf:mcp");
    }

    #[test]
    fn mcp_results_are_tagged() {
        let mcp = Pipeline::Mcp.job(Genre::Comics, &request());
        assert_eq!(mcp.extra["mcp_version"], MCP_VERSION);
        assert_eq!(mcp.extra["analysis_depth"], ENHANCED_DEPTH);
        assert_eq!(mcp.extra["title"], "Dune");

        let original = Pipeline::Original.job(Genre::Comics, &request());
        assert!(original.extra.get("mcp_version").is_none());
        assert_eq!(original.extra["year"], 1965);
    }

    #[test]
    fn enhanced_prompt_embeds_work_details() {
        let mcp = Pipeline::Mcp.job(Genre::ScienceFiction, &request());
        let original = Pipeline::Original.job(Genre::ScienceFiction, &request());
        assert_ne!(mcp.prompt.system, original.prompt.system);
        assert!(mcp.prompt.system.contains("Title: Dune"));
        assert!(mcp.prompt.system.contains("Year: 1965"));
    }
}
