pub mod analysis;
pub mod compare;
pub mod health;
pub mod monitoring;
pub mod sources;
pub mod visualization;

use axum::Router;

use crate::state::AppState;

/// Build the API route tree (everything except `/health` and `/info`).
///
/// Route hierarchy:
///
/// ```text
/// /analyze/{genre}                     single-pipeline analysis (POST)
/// /analyze/character                   RPG character analysis (POST)
/// /analyze/network                     character network metrics (POST)
/// /analyze/temporal                    decade theme trends (POST)
/// /analyze/communities                 work communities (POST)
/// /analyze/parallel/{genre}            original-vs-mcp harness (POST)
/// /analyze/parallel/metrics            harness metrics (GET)
/// /recommend/{genre}                   recommendations (POST)
///
/// /compare/types                       comparison types (GET)
/// /compare/{type}                      multi-work comparison (POST)
///
/// /visualize                           render a chart (POST)
/// /visualization/types                 chart types (GET)
///
/// /monitoring/...                      profiles, checks, channels, housekeeping
///
/// /sources                             registered sources (GET)
/// /{source}/{operation}                source proxy (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/analyze", analysis::analyze_router())
        .nest("/recommend", analysis::recommend_router())
        .nest("/compare", compare::router())
        .nest("/monitoring", monitoring::router())
        .merge(visualization::router())
        // Static prefixes above take priority over the generic proxy route.
        .merge(sources::router())
}
