use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sfmcp_api::background;
use sfmcp_api::config::ServerConfig;
use sfmcp_api::router::build_app_router;
use sfmcp_api::state::AppState;
use sfmcp_events::{DeliveryRouter, EmailConfig, EmailDelivery, WebhookDelivery};
use sfmcp_upstream::{OpenRouterClient, OpenRouterConfig, SourceRegistry};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sfmcp_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- LLM router ---
    let llm = OpenRouterClient::new(OpenRouterConfig::from_env());
    if llm.is_configured() {
        tracing::info!(default_model = llm.default_model(), "OpenRouter client configured");
    } else {
        tracing::warn!("OPENROUTER_API_KEY not set, analysis endpoints will fail as not configured");
    }

    // --- Sources ---
    let sources = SourceRegistry::with_defaults(config.sources_config());
    tracing::info!(sources = ?sources.names(), "Source registry created");

    // --- Email ---
    let email = Arc::new(EmailDelivery::new(EmailConfig::from_env()));

    // --- App state ---
    let state = AppState::new(config.clone(), Arc::new(llm), sources, Arc::clone(&email));
    let event_bus = Arc::clone(&state.event_bus);

    // --- Background services ---
    let cancel = tokio_util::sync::CancellationToken::new();

    // Spawn delivery router (webhooks and email for monitoring events).
    let delivery_router = DeliveryRouter::new(
        Arc::clone(&state.monitoring.webhooks),
        Arc::new(WebhookDelivery::new()),
        email,
    );
    let router_handle = tokio::spawn(delivery_router.run(event_bus.subscribe(), cancel.clone()));

    // Spawn notification retention (hourly by default).
    let retention_handle = tokio::spawn(background::notification_retention::run(
        Arc::clone(&state.monitoring),
        Arc::clone(&state.cache),
        config.notification_retention_days,
        Duration::from_secs(config.retention_interval_secs),
        cancel.clone(),
    ));

    tracing::info!("Background services started (delivery router, notification retention)");

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), retention_handle).await;
    tracing::info!("Notification retention stopped");

    drop(event_bus);
    let _ = tokio::time::timeout(
        Duration::from_secs(config.shutdown_timeout_secs),
        router_handle,
    )
    .await;
    tracing::info!("Delivery router shut down");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
