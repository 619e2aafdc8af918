//! Interest profiles, notifications, delivery channels and housekeeping.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use sfmcp_core::channels::EVENT_WEBHOOK_TEST;
use sfmcp_core::error::CoreError;
use sfmcp_core::monitoring::{
    validate_profile, validate_webhook, CreateInterestProfile, RegisterWebhook,
    WebhookRegistration,
};
use sfmcp_core::types::DbId;
use sfmcp_events::{EmailConfig, MonitoringEvent};

use crate::engine::monitoring::{cleanup, statistics};
use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::response::{DataResponse, ResponseMetadata};
use crate::state::AppState;

const MONITORING_SOURCE: &str = "monitoring";

fn profile_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "InterestProfile",
        id,
    })
}

fn webhook_not_found(id: &str) -> AppError {
    AppError::Core(CoreError::NotFoundKey {
        entity: "Webhook",
        key: id.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Profiles
// ---------------------------------------------------------------------------

/// POST /monitoring/profile
pub async fn create_profile(
    State(state): State<AppState>,
    AppJson(input): AppJson<CreateInterestProfile>,
) -> AppResult<impl IntoResponse> {
    validate_profile(&input)?;
    let profile = state.monitoring.profiles.create(input, Utc::now()).await;
    tracing::info!(profile_id = profile.profile_id, name = %profile.name, "Interest profile created");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "profile_id": profile.profile_id,
            "data": profile,
            "metadata": ResponseMetadata::new(MONITORING_SOURCE, false),
        })),
    ))
}

/// GET /monitoring/profile/{id}
pub async fn get_profile(
    State(state): State<AppState>,
    AppPath(id): AppPath<DbId>,
) -> AppResult<impl IntoResponse> {
    let profile = state
        .monitoring
        .profiles
        .find_by_id(id)
        .await
        .ok_or_else(|| profile_not_found(id))?;
    Ok(Json(DataResponse::new(profile, MONITORING_SOURCE)))
}

/// GET /monitoring/profiles
pub async fn list_profiles(State(state): State<AppState>) -> impl IntoResponse {
    Json(DataResponse::new(
        state.monitoring.profiles.list().await,
        MONITORING_SOURCE,
    ))
}

/// DELETE /monitoring/profile/{id}
///
/// Notifications recorded for the profile are kept until retention removes them.
pub async fn delete_profile(
    State(state): State<AppState>,
    AppPath(id): AppPath<DbId>,
) -> AppResult<StatusCode> {
    if !state.monitoring.profiles.delete(id).await {
        return Err(profile_not_found(id));
    }
    tracing::info!(profile_id = id, "Interest profile deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /monitoring/profile/{id}/check
pub async fn check_profile(
    State(state): State<AppState>,
    AppPath(id): AppPath<DbId>,
) -> AppResult<impl IntoResponse> {
    let outcome = state.checker().check(id).await?;
    Ok(Json(DataResponse::new(outcome, MONITORING_SOURCE)))
}

/// GET /monitoring/profile/{id}/notifications
pub async fn list_notifications(
    State(state): State<AppState>,
    AppPath(id): AppPath<DbId>,
) -> impl IntoResponse {
    Json(DataResponse::new(
        state.monitoring.notifications.list_for_profile(id).await,
        MONITORING_SOURCE,
    ))
}

/// POST /monitoring/check
pub async fn check_all(State(state): State<AppState>) -> impl IntoResponse {
    let results = state.checker().check_all().await;
    let new_notifications: usize = results.iter().map(|r| r.new_notifications.len()).sum();
    Json(DataResponse::new(
        json!({
            "checked": results.len(),
            "new_notifications": new_notifications,
            "results": results,
        }),
        MONITORING_SOURCE,
    ))
}

// ---------------------------------------------------------------------------
// Delivery channels
// ---------------------------------------------------------------------------

/// POST /monitoring/email/config
///
/// Replace the SMTP settings. The password is never echoed back.
pub async fn configure_email(
    State(state): State<AppState>,
    AppJson(input): AppJson<EmailConfig>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    state.email.configure(input.clone()).await;
    tracing::info!(smtp_host = %input.smtp_host, recipients = input.recipients.len(), "Email delivery configured");
    Ok(Json(DataResponse::new(input, MONITORING_SOURCE)))
}

/// POST /monitoring/webhook/{id}
///
/// Registers or replaces a webhook. Returns 201 for a new id, 200 when an
/// existing registration was replaced.
pub async fn register_webhook(
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
    AppJson(input): AppJson<RegisterWebhook>,
) -> AppResult<impl IntoResponse> {
    validate_webhook(&id, &input)?;
    let registration = WebhookRegistration::from_register(&id, input, Utc::now());
    let replaced = state.monitoring.webhooks.upsert(registration.clone()).await;
    tracing::info!(webhook_id = %id, replaced, "Webhook registered");

    let status = if replaced {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(DataResponse::new(registration, MONITORING_SOURCE))))
}

/// DELETE /monitoring/webhook/{id}
pub async fn delete_webhook(
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
) -> AppResult<StatusCode> {
    if !state.monitoring.webhooks.delete(&id).await {
        return Err(webhook_not_found(&id));
    }
    tracing::info!(webhook_id = %id, "Webhook deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /monitoring/webhooks
pub async fn list_webhooks(State(state): State<AppState>) -> impl IntoResponse {
    Json(DataResponse::new(
        state.monitoring.webhooks.list().await,
        MONITORING_SOURCE,
    ))
}

/// POST /monitoring/webhook/{id}/test
///
/// Queue a `webhook.test` event addressed to this webhook only.
pub async fn test_webhook(
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
) -> AppResult<impl IntoResponse> {
    if state.monitoring.webhooks.find_by_id(&id).await.is_none() {
        return Err(webhook_not_found(&id));
    }
    let event = MonitoringEvent::new(EVENT_WEBHOOK_TEST)
        .for_webhook(id.clone())
        .with_payload(json!({ "message": "Test delivery from SFMCP" }));
    let receivers = state.event_bus.publish(event);

    Ok((
        StatusCode::ACCEPTED,
        Json(DataResponse::new(
            json!({
                "webhook_id": id,
                "event_type": EVENT_WEBHOOK_TEST,
                "queued": receivers > 0,
            }),
            MONITORING_SOURCE,
        )),
    ))
}

// ---------------------------------------------------------------------------
// Housekeeping
// ---------------------------------------------------------------------------

/// GET /monitoring/statistics
pub async fn get_statistics(State(state): State<AppState>) -> impl IntoResponse {
    let email_configured = state.email.is_configured().await;
    Json(DataResponse::new(
        statistics(&state.monitoring, email_configured).await,
        MONITORING_SOURCE,
    ))
}

#[derive(Debug, Deserialize)]
pub struct CleanupQuery {
    pub days: Option<i64>,
}

/// POST /monitoring/cleanup?days=N
///
/// Purge notifications older than `days` (default: the configured retention).
pub async fn run_cleanup(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<CleanupQuery>,
) -> AppResult<impl IntoResponse> {
    let days = query
        .days
        .unwrap_or(state.config.notification_retention_days);
    let deleted = cleanup(&state.monitoring, days).await?;
    tracing::info!(days, deleted, "Notification cleanup finished");
    Ok(Json(DataResponse::new(
        json!({ "deleted": deleted, "days": days }),
        MONITORING_SOURCE,
    )))
}
