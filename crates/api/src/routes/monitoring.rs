//! Route definitions for content monitoring.
//!
//! ```text
//! PROFILES:
//! POST   /profile                         create_profile
//! GET    /profiles                        list_profiles
//! GET    /profile/{id}                    get_profile
//! DELETE /profile/{id}                    delete_profile
//! POST   /profile/{id}/check              check_profile
//! GET    /profile/{id}/notifications      list_notifications
//! POST   /check                           check_all
//!
//! CHANNELS:
//! POST   /email/config                    configure_email
//! GET    /webhooks                        list_webhooks
//! POST   /webhook/{id}                    register_webhook
//! DELETE /webhook/{id}                    delete_webhook
//! POST   /webhook/{id}/test               test_webhook
//!
//! HOUSEKEEPING:
//! GET    /statistics                      get_statistics
//! POST   /cleanup?days=N                  run_cleanup
//! ```

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::monitoring;
use crate::state::AppState;

/// Monitoring routes, mounted at `/monitoring`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profile", post(monitoring::create_profile))
        .route("/profiles", get(monitoring::list_profiles))
        .route(
            "/profile/{id}",
            get(monitoring::get_profile).delete(monitoring::delete_profile),
        )
        .route("/profile/{id}/check", post(monitoring::check_profile))
        .route(
            "/profile/{id}/notifications",
            get(monitoring::list_notifications),
        )
        .route("/check", post(monitoring::check_all))
        .route("/email/config", post(monitoring::configure_email))
        .route("/webhooks", get(monitoring::list_webhooks))
        .route(
            "/webhook/{id}",
            post(monitoring::register_webhook).delete(monitoring::delete_webhook),
        )
        .route("/webhook/{id}/test", post(monitoring::test_webhook))
        .route("/statistics", get(monitoring::get_statistics))
        .route("/cleanup", post(monitoring::run_cleanup))
}
