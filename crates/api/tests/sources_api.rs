//! HTTP-level tests for the source proxy.

mod common;

use std::sync::atomic::Ordering;

use axum::http::StatusCode;
use common::{body_json, build_test_app_with, get, post_empty, post_json, FakeLlm};
use serde_json::json;

// ---------------------------------------------------------------------------
// Test: GET /sources lists registered sources and operations
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sources_are_listed_with_operations() {
    let app = build_test_app_with(FakeLlm::default());
    let json = body_json(get(app.router.clone(), "/sources").await).await;

    let sources = json["data"].as_array().unwrap();
    let books = sources.iter().find(|s| s["name"] == "openlibrary").unwrap();
    assert_eq!(books["operations"][0]["name"], "search");
    assert_eq!(books["operations"][0]["required"], json!(["query"]));
}

// ---------------------------------------------------------------------------
// Test: proxy responses are cached by parameters
// ---------------------------------------------------------------------------

#[tokio::test]
async fn repeated_fetch_is_served_from_cache() {
    let app = build_test_app_with(FakeLlm::default());
    let body = json!({ "query": "neuromancer" });

    let first = post_json(app.router.clone(), "/openlibrary/search", body.clone()).await;
    assert_eq!(first.status(), StatusCode::OK);
    let first = body_json(first).await;
    assert_eq!(first["data"]["query"], "neuromancer");
    assert_eq!(first["metadata"]["source"], "openlibrary");
    assert_eq!(first["metadata"]["cache_hit"], false);

    let second = body_json(post_json(app.router.clone(), "/openlibrary/search", body).await).await;
    assert_eq!(second["metadata"]["cache_hit"], true);
    assert_eq!(second["data"], first["data"]);
    assert_eq!(app.books.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn force_refresh_is_stripped_and_bypasses_cache() {
    let app = build_test_app_with(FakeLlm::default());

    post_json(app.router.clone(), "/openlibrary/search", json!({ "query": "dune" })).await;
    let refreshed = body_json(
        post_json(
            app.router.clone(),
            "/openlibrary/search",
            json!({ "query": "dune", "force_refresh": true }),
        )
        .await,
    )
    .await;

    assert_eq!(refreshed["metadata"]["cache_hit"], false);
    assert_eq!(app.books.calls.load(Ordering::SeqCst), 2);

    // The refreshed entry shares the key of the plain request.
    let cached = body_json(
        post_json(app.router.clone(), "/openlibrary/search", json!({ "query": "dune" })).await,
    )
    .await;
    assert_eq!(cached["metadata"]["cache_hit"], true);
}

// ---------------------------------------------------------------------------
// Test: unknown sources, operations and missing parameters
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_source_returns_404() {
    let app = build_test_app_with(FakeLlm::default());
    let response = post_json(app.router.clone(), "/amazon/search", json!({ "query": "x" })).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["exists"], false);
    assert_eq!(json["details"]["code"], "UNKNOWN_OPERATION");
}

#[tokio::test]
async fn unsupported_operation_returns_404() {
    let app = build_test_app_with(FakeLlm::default());
    let response = post_json(app.router.clone(), "/openlibrary/teleport", json!({})).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn missing_required_parameter_never_reaches_the_source() {
    let app = build_test_app_with(FakeLlm::default());

    let response = post_empty(app.router.clone(), "/openlibrary/search").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.books.calls.load(Ordering::SeqCst), 0);
    assert_eq!(app.state.cache.stats().await.misses, 0);
}

// ---------------------------------------------------------------------------
// Test: a rate-limited upstream returns the 503 error envelope
// ---------------------------------------------------------------------------

#[tokio::test]
async fn rate_limited_source_returns_503_envelope() {
    let app = build_test_app_with(FakeLlm::default());

    let response = post_json(
        app.router.clone(),
        "/wikipedia/summary",
        json!({ "title": "Dune (novel)" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.headers()["retry-after"], "12");
    let json = body_json(response).await;
    assert_eq!(json["exists"], false);
    assert_eq!(json["details"]["retryable"], true);
    assert_eq!(json["details"]["source"], "wikipedia");
    assert_eq!(app.state.cache.stats().await.writes, 0);
}
