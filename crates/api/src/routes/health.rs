use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;
use sfmcp_store::CacheStats;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Model used when a request does not name one.
    pub default_model: String,
    /// Cache backend name and counters.
    pub cache_backend: &'static str,
    pub cache: CacheStats,
    pub sources: Vec<&'static str>,
    pub email_configured: bool,
}

/// GET /health -- returns service status and cache counters.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        default_model: state.llm.resolve_model(None),
        cache_backend: state.cache.name(),
        cache: state.cache.stats().await,
        sources: state.sources.names(),
        email_configured: state.email.is_configured().await,
    })
}

/// Service description payload.
#[derive(Serialize)]
pub struct InfoResponse {
    pub name: &'static str,
    pub version: &'static str,
    pub description: &'static str,
    pub genres: Vec<&'static str>,
    pub endpoints: Vec<&'static str>,
}

/// GET /info -- static service description.
async fn info() -> Json<InfoResponse> {
    Json(InfoResponse {
        name: "SFMCP API",
        version: env!("CARGO_PKG_VERSION"),
        description: "Science fiction, comics and RPG content analysis",
        genres: sfmcp_core::domain::Genre::ALL
            .iter()
            .map(|g| g.as_str())
            .collect(),
        endpoints: vec![
            "/analyze/{genre}",
            "/analyze/character",
            "/analyze/network",
            "/analyze/temporal",
            "/analyze/communities",
            "/analyze/parallel/{genre}",
            "/recommend/{genre}",
            "/compare/{type}",
            "/visualize",
            "/monitoring",
            "/sources",
            "/{source}/{operation}",
        ],
    })
}

/// Mount the health and info routes at the root.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/info", get(info))
}
