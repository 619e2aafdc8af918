//! Handlers for multi-work comparisons.

use axum::extract::State;
use axum::Json;
use serde_json::{json, Map, Value};
use sfmcp_core::domain::{ComparisonType, ResultType};
use sfmcp_core::fingerprint::Fingerprint;
use sfmcp_core::prompts::comparison_prompt;
use sfmcp_core::requests::ComparisonRequest;

use crate::engine::dispatcher::AnalysisJob;
use crate::error::AppResult;
use crate::extract::{AppJson, AppPath};
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /compare/{type}
///
/// Compare 2 to 5 works. `/compare/works` accepts an `analysis_type` in the
/// body; the other routes fix the type from the path.
pub async fn compare(
    State(state): State<AppState>,
    AppPath(kind): AppPath<String>,
    AppJson(input): AppJson<ComparisonRequest>,
) -> AppResult<Json<Value>> {
    let kind = input.resolve_type(ComparisonType::parse(&kind)?)?;
    input.validate()?;

    let titles: Vec<&str> = input.works.iter().map(|w| w.title_or_untitled()).collect();
    let mut extra = Map::new();
    extra.insert("comparison_type".into(), Value::from(kind.as_str()));
    extra.insert("works".into(), json!(titles));
    extra.insert("enhanced".into(), Value::Bool(input.enhanced));

    let job = AnalysisJob::new(
        input.fingerprint_fields(Fingerprint::new(format!("compare:{kind}"))),
        comparison_prompt(kind, &input.works, input.enhanced),
        ResultType::Comparative,
    )
    .model(input.model.clone())
    .force_refresh(input.force_refresh)
    .extra(extra);

    let dispatched = state.dispatcher().dispatch(job).await?;
    Ok(Json(dispatched.into_body()))
}

/// GET /compare/types
pub async fn list_types() -> Json<DataResponse<Vec<Value>>> {
    let types = ComparisonType::ALL
        .iter()
        .map(|t| json!({ "type": t.as_str(), "description": t.description() }))
        .collect();
    Json(DataResponse::new(types, "sfmcp"))
}
