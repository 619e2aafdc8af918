//! Handlers for single-pipeline analyses and recommendations.

use axum::extract::State;
use axum::Json;
use serde_json::{Map, Value};
use sfmcp_core::domain::{Genre, ResultType};
use sfmcp_core::fingerprint::Fingerprint;
use sfmcp_core::prompts::{character_prompt, recommendation_prompt};
use sfmcp_core::requests::{AnalysisRequest, CharacterAnalysisRequest, RecommendationRequest};

use crate::engine::dispatcher::AnalysisJob;
use crate::engine::pipeline::Pipeline;
use crate::error::AppResult;
use crate::extract::{AppJson, AppPath};
use crate::state::AppState;

/// POST /analyze/{genre}
///
/// Analyse a science-fiction, comics or RPG text. Served from cache when an
/// identical request was answered within the TTL.
pub async fn analyze(
    State(state): State<AppState>,
    AppPath(genre): AppPath<String>,
    AppJson(input): AppJson<AnalysisRequest>,
) -> AppResult<Json<Value>> {
    let genre = Genre::parse(&genre)?;
    input.validate(genre)?;

    let dispatched = Pipeline::Original
        .run(&state.dispatcher(), genre, &input)
        .await?;
    Ok(Json(dispatched.into_body()))
}

/// POST /analyze/character
pub async fn analyze_character(
    State(state): State<AppState>,
    AppJson(input): AppJson<CharacterAnalysisRequest>,
) -> AppResult<Json<Value>> {
    input.validate()?;

    let mut extra = Map::new();
    extra.insert("system".into(), Value::String(input.system.trim().to_string()));

    let job = AnalysisJob::new(
        input.fingerprint_fields(Fingerprint::new("analyze:character")),
        character_prompt(input.system.trim(), &input.character_sheet),
        ResultType::Character,
    )
    .model(input.model.clone())
    .force_refresh(input.force_refresh)
    .extra(extra);

    let dispatched = state.dispatcher().dispatch(job).await?;
    Ok(Json(dispatched.into_body()))
}

/// POST /recommend/{genre}
pub async fn recommend(
    State(state): State<AppState>,
    AppPath(genre): AppPath<String>,
    AppJson(input): AppJson<RecommendationRequest>,
) -> AppResult<Json<Value>> {
    let genre = Genre::parse(&genre)?;
    input.validate()?;

    let mut extra = Map::new();
    extra.insert("based_on".into(), Value::String(input.based_on.trim().to_string()));
    extra.insert("limit".into(), Value::from(input.limit()));

    let job = AnalysisJob::new(
        input.fingerprint_fields(Fingerprint::new(format!("recommend:{genre}"))),
        recommendation_prompt(genre, &input.based_on, input.limit()),
        genre.result_type(),
    )
    .model(input.model.clone())
    .force_refresh(input.force_refresh)
    .extra(extra);

    let dispatched = state.dispatcher().dispatch(job).await?;
    Ok(Json(dispatched.into_body()))
}
