//! Handlers for the original-vs-mcp comparison harness.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use sfmcp_core::domain::Genre;
use sfmcp_core::execution::ExecutionMode;
use sfmcp_core::requests::AnalysisRequest;

use crate::engine::parallel::{MetricsSnapshot, ParallelOutcome};
use crate::error::AppResult;
use crate::extract::{AppJson, AppPath};
use crate::response::DataResponse;
use crate::state::AppState;

const PARALLEL_SOURCE: &str = "parallel";

/// Body of `POST /analyze/parallel/{genre}`: an analysis request plus an
/// optional execution mode (`original`, `mcp` or `parallel`).
#[derive(Debug, Deserialize)]
pub struct ParallelAnalysisRequest {
    #[serde(flatten)]
    pub request: AnalysisRequest,
    pub mode: Option<String>,
}

/// POST /analyze/parallel/{genre}
///
/// Branch failures are reported inside the outcome; the request itself only
/// fails on validation.
pub async fn analyze(
    State(state): State<AppState>,
    AppPath(genre): AppPath<String>,
    AppJson(input): AppJson<ParallelAnalysisRequest>,
) -> AppResult<Json<DataResponse<ParallelOutcome>>> {
    let genre = Genre::parse(&genre)?;
    let mode = match input.mode.as_deref() {
        Some(mode) => ExecutionMode::parse(mode)?,
        None => ExecutionMode::default(),
    };
    input.request.validate(genre)?;

    let outcome = state.harness().run(mode, genre, &input.request).await;
    Ok(Json(DataResponse::new(outcome, PARALLEL_SOURCE)))
}

/// GET /analyze/parallel/metrics
pub async fn metrics(State(state): State<AppState>) -> Json<DataResponse<MetricsSnapshot>> {
    Json(DataResponse::new(
        state.parallel_metrics.snapshot().await,
        PARALLEL_SOURCE,
    ))
}
