//! Handlers for the structural analyses that run locally, without the LLM:
//! character networks, decade trends and work communities.

use axum::Json;
use sfmcp_core::community::{analyze_communities, CommunityReport, CommunityRequest};
use sfmcp_core::network::{analyze_network, NetworkReport, NetworkRequest};
use sfmcp_core::temporal::{analyze_temporal, TemporalReport, TemporalRequest};

use crate::error::AppResult;
use crate::extract::AppJson;
use crate::response::DataResponse;

const PATTERNS_SOURCE: &str = "analysis";

/// POST /analyze/network
pub async fn network(
    AppJson(input): AppJson<NetworkRequest>,
) -> AppResult<Json<DataResponse<NetworkReport>>> {
    let report = analyze_network(&input)?;
    tracing::debug!(
        characters = report.metrics.total_characters,
        communities = report.communities.len(),
        "Character network analyzed"
    );
    Ok(Json(DataResponse::new(report, PATTERNS_SOURCE)))
}

/// POST /analyze/temporal
pub async fn temporal(
    AppJson(input): AppJson<TemporalRequest>,
) -> AppResult<Json<DataResponse<TemporalReport>>> {
    let report = analyze_temporal(&input)?;
    Ok(Json(DataResponse::new(report, PATTERNS_SOURCE)))
}

/// POST /analyze/communities
pub async fn communities(
    AppJson(input): AppJson<CommunityRequest>,
) -> AppResult<Json<DataResponse<CommunityReport>>> {
    let report = analyze_communities(&input)?;
    Ok(Json(DataResponse::new(report, PATTERNS_SOURCE)))
}
