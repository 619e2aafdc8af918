//! Route definitions for the source proxy.
//!
//! ```text
//! GET    /sources                    list_sources
//! POST   /{source}/{operation}       fetch
//! ```

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::sources;
use crate::state::AppState;

/// Source routes, merged at the root.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sources", get(sources::list_sources))
        .route("/{source}/{operation}", post(sources::fetch))
}
