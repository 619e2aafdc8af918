//! Route definitions for analyses and recommendations.
//!
//! ```text
//! ANALYZE (mounted at /analyze):
//! POST   /character                  analyze_character
//! POST   /network                    patterns::network
//! POST   /temporal                   patterns::temporal
//! POST   /communities                patterns::communities
//! GET    /parallel/metrics           parallel::metrics
//! POST   /parallel/{genre}           parallel::analyze
//! POST   /{genre}                    analyze
//!
//! RECOMMEND (mounted at /recommend):
//! POST   /{genre}                    recommend
//! ```

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{analysis, parallel, patterns};
use crate::state::AppState;

/// Analysis routes, mounted at `/analyze`.
pub fn analyze_router() -> Router<AppState> {
    Router::new()
        .route("/character", post(analysis::analyze_character))
        .route("/network", post(patterns::network))
        .route("/temporal", post(patterns::temporal))
        .route("/communities", post(patterns::communities))
        .route("/parallel/metrics", get(parallel::metrics))
        .route("/parallel/{genre}", post(parallel::analyze))
        .route("/{genre}", post(analysis::analyze))
}

/// Recommendation routes, mounted at `/recommend`.
pub fn recommend_router() -> Router<AppState> {
    Router::new().route("/{genre}", post(analysis::recommend))
}
