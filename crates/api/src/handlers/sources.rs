//! Generic proxy onto the registered data sources.

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use serde_json::{Map, Value};
use sfmcp_core::fingerprint::Fingerprint;
use sfmcp_upstream::source::check_required;
use sfmcp_upstream::SourceDescription;

use crate::error::{AppError, AppResult};
use crate::extract::AppPath;
use crate::response::{DataResponse, ResponseMetadata};
use crate::state::AppState;

/// GET /sources
pub async fn list_sources(State(state): State<AppState>) -> Json<DataResponse<Vec<SourceDescription>>> {
    Json(DataResponse::new(state.sources.describe(), "sfmcp"))
}

/// POST /{source}/{operation}
///
/// The body is the operation's parameter object (may be empty). A
/// `force_refresh` flag in it bypasses the cache lookup and is not passed
/// on to the source.
pub async fn fetch(
    State(state): State<AppState>,
    AppPath((source_name, operation)): AppPath<(String, String)>,
    body: Bytes,
) -> AppResult<Json<DataResponse<Value>>> {
    let mut params = parse_params(&body)?;
    let force_refresh = params
        .remove("force_refresh")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    let params = Value::Object(params);

    // Unknown sources, operations and missing parameters never reach the cache.
    let source = state.sources.get(&source_name)?;
    let op = source
        .operation(&operation)
        .ok_or_else(|| source.unsupported(&operation))?;
    check_required(op, &params)?;

    let key = Fingerprint::new(format!("source:{}:{}", source.name(), op.name))
        .json("params", &params)
        .finish();

    if !force_refresh {
        match state.cache.get(&key).await {
            Ok(Some(cached)) => {
                tracing::debug!(key = %key, "Source response served from cache");
                return Ok(Json(DataResponse {
                    data: cached.value,
                    metadata: ResponseMetadata::new(source.name(), true),
                }));
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(key = %key, error = %e, "Cache lookup failed, treating as miss"),
        }
    }

    let data = source.fetch(op.name, &params).await?;
    if let Err(e) = state.cache.put(&key, data.clone()).await {
        tracing::warn!(key = %key, error = %e, "Failed to store source response in cache");
    }

    Ok(Json(DataResponse::new(data, source.name())))
}

fn parse_params(body: &[u8]) -> AppResult<Map<String, Value>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(Value::Null) => Ok(Map::new()),
        Ok(_) => Err(AppError::BadRequest(
            "parameters must be a JSON object".into(),
        )),
        Err(e) => Err(AppError::BadRequest(format!("Invalid JSON body: {e}"))),
    }
}
