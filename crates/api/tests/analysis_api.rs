//! HTTP-level tests for `/analyze`, `/recommend` and `/compare`.

mod common;

use axum::http::StatusCode;
use common::{body_json, build_test_app_with, get, post_json, FakeLlm};
use serde_json::json;

fn dune() -> serde_json::Value {
    json!({
        "content": "A desert planet, a spice, a prophecy.",
        "title": "Dune",
        "author": "Frank Herbert",
        "year": 1965,
    })
}

// ---------------------------------------------------------------------------
// Test: identical analyses are served from cache the second time
// ---------------------------------------------------------------------------

#[tokio::test]
async fn second_identical_analysis_is_a_cache_hit() {
    let app = build_test_app_with(FakeLlm::default());

    let first = post_json(app.router.clone(), "/analyze/sf", dune()).await;
    assert_eq!(first.status(), StatusCode::OK);
    let first = body_json(first).await;
    assert_eq!(first["type"], "sf");
    assert_eq!(first["title"], "Dune");
    assert_eq!(first["metadata"]["cache_hit"], false);
    assert_eq!(first["metadata"]["source"], "openrouter");
    assert_eq!(first["metadata"]["model"], "test/default-model");

    let second = body_json(post_json(app.router.clone(), "/analyze/sf", dune()).await).await;
    assert_eq!(second["metadata"]["cache_hit"], true);
    assert_eq!(second["analysis"], first["analysis"]);
    assert_eq!(app.llm.calls(), 1);
}

// ---------------------------------------------------------------------------
// Test: force_refresh bypasses the cache lookup
// ---------------------------------------------------------------------------

#[tokio::test]
async fn force_refresh_calls_the_llm_again() {
    let app = build_test_app_with(FakeLlm::default());

    post_json(app.router.clone(), "/analyze/comics", dune()).await;
    let mut body = dune();
    body["force_refresh"] = json!(true);
    let refreshed = body_json(post_json(app.router.clone(), "/analyze/comics", body).await).await;

    assert_eq!(refreshed["metadata"]["cache_hit"], false);
    assert_eq!(app.llm.calls(), 2);
}

// ---------------------------------------------------------------------------
// Test: validation failures never reach the LLM
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_content_is_rejected_before_the_llm() {
    let app = build_test_app_with(FakeLlm::default());

    let response = post_json(app.router.clone(), "/analyze/sf", json!({ "content": "  " })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["exists"], false);
    assert_eq!(app.llm.calls(), 0);
}

#[tokio::test]
async fn unknown_genre_is_rejected() {
    let app = build_test_app_with(FakeLlm::default());
    let response = post_json(app.router.clone(), "/analyze/western", dune()).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.llm.calls(), 0);
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let app = build_test_app_with(FakeLlm::default());
    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/analyze/sf")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    let response = tower::ServiceExt::oneshot(app.router.clone(), request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["details"]["code"], "BAD_REQUEST");
}

// ---------------------------------------------------------------------------
// Test: LLM failures surface as 503 and are not cached
// ---------------------------------------------------------------------------

#[tokio::test]
async fn llm_rate_limit_returns_503_with_retry_after() {
    let app = build_test_app_with(FakeLlm::failing());

    let response = post_json(app.router.clone(), "/analyze/comics", dune()).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.headers()["retry-after"], "7");
    let json = body_json(response).await;
    assert_eq!(json["details"]["retryable"], true);

    post_json(app.router.clone(), "/analyze/comics", dune()).await;
    assert_eq!(app.llm.calls(), 2);
    assert_eq!(app.state.cache.stats().await.writes, 0);
}

// ---------------------------------------------------------------------------
// Test: character analysis and recommendations
// ---------------------------------------------------------------------------

#[tokio::test]
async fn character_analysis_requires_a_system() {
    let app = build_test_app_with(FakeLlm::default());

    let missing = post_json(
        app.router.clone(),
        "/analyze/character",
        json!({ "character_sheet": "Fighter 5, STR 18" }),
    )
    .await;
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

    let ok = post_json(
        app.router.clone(),
        "/analyze/character",
        json!({ "character_sheet": "Fighter 5, STR 18", "system": "D&D 5e" }),
    )
    .await;
    assert_eq!(ok.status(), StatusCode::OK);
    let json = body_json(ok).await;
    assert_eq!(json["type"], "character");
    assert_eq!(json["system"], "D&D 5e");
    assert_eq!(app.llm.calls(), 1);
}

#[tokio::test]
async fn recommendations_echo_their_inputs() {
    let app = build_test_app_with(FakeLlm::default());

    let response = post_json(
        app.router.clone(),
        "/recommend/sf",
        json!({ "based_on": "Foundation", "limit": 3 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["based_on"], "Foundation");
    assert_eq!(json["limit"], 3);
}

// ---------------------------------------------------------------------------
// Test: comparisons need between 2 and 5 works
// ---------------------------------------------------------------------------

#[tokio::test]
async fn comparison_work_count_is_enforced() {
    let app = build_test_app_with(FakeLlm::default());
    let work = json!({ "title": "Dune", "author": "Frank Herbert" });

    for count in [0usize, 1, 6] {
        let works: Vec<_> = std::iter::repeat(work.clone()).take(count).collect();
        let response = post_json(
            app.router.clone(),
            "/compare/themes",
            json!({ "works": works }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{count} works");
    }
    assert_eq!(app.llm.calls(), 0);
}

#[tokio::test]
async fn works_route_honours_analysis_type() {
    let app = build_test_app_with(FakeLlm::default());

    let response = post_json(
        app.router.clone(),
        "/compare/works",
        json!({
            "works": [
                { "title": "Dune", "author": "Frank Herbert" },
                { "title": "Foundation", "author": "Isaac Asimov" },
            ],
            "analysis_type": "plot",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["type"], "comparative");
    assert_eq!(json["comparison_type"], "plot");
    assert_eq!(json["works"], json!(["Dune", "Foundation"]));
}

#[tokio::test]
async fn comparison_types_are_listed() {
    let app = build_test_app_with(FakeLlm::default());
    let json = body_json(get(app.router.clone(), "/compare/types").await).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 5);
}
