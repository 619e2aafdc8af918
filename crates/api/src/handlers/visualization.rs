use axum::extract::State;
use axum::Json;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Value};
use sfmcp_core::visualization::{parse_chart_data, validate_format, VisualizationRequest, VisualizationType};

use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::response::DataResponse;
use crate::state::AppState;

const VISUALIZATION_SOURCE: &str = "visualization";

/// POST /visualize
///
/// Render a network, timeline or comparative chart. The image is returned
/// base64-encoded.
pub async fn visualize(
    State(state): State<AppState>,
    AppJson(input): AppJson<VisualizationRequest>,
) -> AppResult<Json<DataResponse<Value>>> {
    let kind = VisualizationType::parse(&input.kind)?;
    let format = validate_format(input.format.as_deref())?;
    if format != state.renderer.format() {
        return Err(AppError::BadRequest(format!(
            "Format '{format}' is not supported by the configured renderer"
        )));
    }
    let chart = parse_chart_data(kind, &input.data)?;

    let bytes = state.renderer.render(&chart)?;
    tracing::debug!(kind = kind.as_str(), bytes = bytes.len(), "Chart rendered");

    Ok(Json(DataResponse::new(
        json!({
            "type": kind.as_str(),
            "format": format,
            "image": STANDARD.encode(bytes),
        }),
        VISUALIZATION_SOURCE,
    )))
}

/// GET /visualization/types
pub async fn list_types() -> Json<DataResponse<Vec<Value>>> {
    let types = VisualizationType::ALL
        .iter()
        .map(|t| {
            json!({
                "type": t.as_str(),
                "description": t.description(),
                "required_fields": t.required_fields(),
            })
        })
        .collect();
    Json(DataResponse::new(types, VISUALIZATION_SOURCE))
}
