use axum::routing::{get, post};
use axum::Router;

use crate::handlers::visualization;
use crate::state::AppState;

/// Chart rendering routes, merged at the root.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/visualize", post(visualization::visualize))
        .route("/visualization/types", get(visualization::list_types))
}
