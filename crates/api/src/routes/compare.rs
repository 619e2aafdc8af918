//! Route definitions for comparisons.
//!
//! ```text
//! GET    /types                      list_types
//! POST   /{type}                     compare
//! ```

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::compare;
use crate::state::AppState;

/// Comparison routes, mounted at `/compare`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/types", get(compare::list_types))
        .route("/{kind}", post(compare::compare))
}
