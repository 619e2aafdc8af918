//! HTTP-level tests for the original-vs-mcp harness.

mod common;

use axum::http::StatusCode;
use common::{body_json, build_test_app_with, get, post_json, FakeLlm};
use serde_json::json;

fn request(mode: Option<&str>) -> serde_json::Value {
    let mut body = json!({
        "content": "Hari Seldon predicts the fall of the Empire.",
        "title": "Foundation",
        "author": "Isaac Asimov",
    });
    if let Some(mode) = mode {
        body["mode"] = json!(mode);
    }
    body
}

// ---------------------------------------------------------------------------
// Test: parallel mode runs both pipelines and compares them
// ---------------------------------------------------------------------------

#[tokio::test]
async fn parallel_mode_runs_both_pipelines() {
    let app = build_test_app_with(FakeLlm::default());

    let response = post_json(app.router.clone(), "/analyze/parallel/sf", request(None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let data = &json["data"];

    assert_eq!(data["mode"], "parallel");
    assert_eq!(data["original"]["success"], true);
    assert_eq!(data["mcp"]["success"], true);
    assert_eq!(data["mcp"]["result"]["mcp_version"], "1.0");
    assert!(data["original"]["result"].get("mcp_version").is_none());
    assert_eq!(data["comparison"]["identical"], false);
    assert!(data["comparison"]["missing_in_original"]
        .as_array()
        .unwrap()
        .iter()
        .any(|k| k == "mcp_version"));
    assert_eq!(json["metadata"]["source"], "parallel");
    assert_eq!(app.llm.calls(), 2);

    let metrics = body_json(get(app.router.clone(), "/analyze/parallel/metrics").await).await;
    assert_eq!(metrics["data"]["parallel_calls"], 1);
    assert_eq!(metrics["data"]["original"]["calls"], 1);
    assert_eq!(metrics["data"]["mcp"]["successes"], 1);
}

// ---------------------------------------------------------------------------
// Test: single-pipeline modes leave the other branch untouched
// ---------------------------------------------------------------------------

#[tokio::test]
async fn mcp_mode_runs_only_mcp() {
    let app = build_test_app_with(FakeLlm::default());

    let json = body_json(
        post_json(app.router.clone(), "/analyze/parallel/comics", request(Some("mcp"))).await,
    )
    .await;
    assert_eq!(json["data"]["mode"], "mcp");
    assert!(json["data"]["original"].is_null());
    assert!(json["data"]["comparison"].is_null());
    assert_eq!(app.llm.calls(), 1);

    let metrics = body_json(get(app.router.clone(), "/analyze/parallel/metrics").await).await;
    assert_eq!(metrics["data"]["parallel_calls"], 0);
    assert_eq!(metrics["data"]["original"]["calls"], 0);
    assert_eq!(metrics["data"]["mcp"]["calls"], 1);
}

// ---------------------------------------------------------------------------
// Test: branch failures are reported, not raised
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failing_llm_is_reported_per_branch() {
    let app = build_test_app_with(FakeLlm::failing());

    let response = post_json(app.router.clone(), "/analyze/parallel/sf", request(None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["original"]["success"], false);
    assert_eq!(json["data"]["mcp"]["success"], false);
    assert!(json["data"]["original"]["error"].is_string());
    assert!(json["data"]["comparison"].is_null());

    let metrics = body_json(get(app.router.clone(), "/analyze/parallel/metrics").await).await;
    assert_eq!(metrics["data"]["original"]["successes"], 0);
    assert_eq!(
        metrics["data"]["original"]["recent_errors"].as_array().unwrap().len(),
        1
    );
}

#[tokio::test]
async fn invalid_mode_and_content_are_rejected() {
    let app = build_test_app_with(FakeLlm::default());

    let bad_mode = post_json(app.router.clone(), "/analyze/parallel/sf", request(Some("both"))).await;
    assert_eq!(bad_mode.status(), StatusCode::BAD_REQUEST);

    let empty = post_json(
        app.router.clone(),
        "/analyze/parallel/sf",
        json!({ "content": "" }),
    )
    .await;
    assert_eq!(empty.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.llm.calls(), 0);
}
