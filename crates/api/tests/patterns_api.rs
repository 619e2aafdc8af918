//! HTTP-level tests for the network, temporal and community analyses.

mod common;

use axum::http::StatusCode;
use common::{body_json, build_test_app, post_json};
use serde_json::json;

#[tokio::test]
async fn network_reports_central_characters_and_communities() {
    let app = build_test_app();
    let response = post_json(
        app,
        "/analyze/network",
        json!({
            "works": [
                {
                    "title": "Dune",
                    "year": 1965,
                    "characters": [
                        {
                            "name": "Paul",
                            "role": "protagonist",
                            "relationships": [
                                { "target": "Jessica", "type": "family" },
                                { "target": "Chani", "type": "romantic" },
                                { "target": "Stilgar", "type": "ally" },
                            ],
                        },
                        { "name": "Jessica", "role": "mentor" },
                    ],
                },
                {
                    "title": "Neuromancer",
                    "characters": [{ "name": "Case" }],
                },
            ],
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["metadata"]["source"], "analysis");

    let data = &json["data"];
    assert_eq!(data["metrics"]["total_characters"], 5);
    assert_eq!(data["metrics"]["total_connections"], 3);
    assert_eq!(data["central_characters"][0]["character"], "Paul");
    assert_eq!(data["central_characters"][0]["degree"], 3);
    assert!(data["central_characters"][0]["betweenness"].as_f64().unwrap() > 0.0);
    assert_eq!(data["communities"].as_array().unwrap().len(), 1);
    assert_eq!(data["communities"][0]["size"], 4);
    assert_eq!(data["isolated_characters"], json!(["Case"]));
}

#[tokio::test]
async fn network_chart_can_be_rendered() {
    let app = build_test_app();
    let response = post_json(
        app.clone(),
        "/analyze/network",
        json!({
            "works": [{
                "title": "Dune",
                "characters": [{ "name": "Paul", "relationships": [{ "target": "Jessica" }] }],
            }],
        }),
    )
    .await;
    let chart = body_json(response).await["data"]["chart"].clone();

    let rendered = post_json(app, "/visualize", json!({ "type": "network", "data": chart })).await;
    assert_eq!(rendered.status(), StatusCode::OK);
}

#[tokio::test]
async fn network_without_characters_is_a_validation_error() {
    let app = build_test_app();
    let response = post_json(
        app,
        "/analyze/network",
        json!({ "works": [{ "title": "Empty", "characters": [] }] }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["exists"], false);
    assert_eq!(json["details"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn temporal_groups_works_by_decade() {
    let app = build_test_app();
    let response = post_json(
        app,
        "/analyze/temporal",
        json!({
            "works": [
                { "title": "Dune", "year": 1965, "themes": ["ecology", "religion"] },
                { "title": "Dune Messiah", "year": 1969, "themes": ["religion"] },
                { "title": "Neuromancer", "year": 1984, "themes": ["ai"] },
                { "title": "Undated" },
            ],
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let data = body_json(response).await["data"].clone();
    assert_eq!(data["dated_works"], 3);
    assert_eq!(data["undated_works"], 1);
    assert_eq!(data["decades"][0]["label"], "1960s");
    assert_eq!(data["decades"][0]["common_themes"][0]["theme"], "religion");
    assert_eq!(data["trends"][0]["period"], "1960s-1980s");
    assert_eq!(data["trends"][0]["themes"]["emerging"], json!(["ai"]));
}

#[tokio::test]
async fn temporal_without_years_is_rejected() {
    let app = build_test_app();
    let response = post_json(
        app,
        "/analyze/temporal",
        json!({ "works": [{ "title": "Undated" }] }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn communities_report_overlaps() {
    let app = build_test_app();
    let response = post_json(
        app,
        "/analyze/communities",
        json!({
            "works": [
                { "title": "Dune", "author": "Frank Herbert", "year": 1965, "genres": ["sf"], "rating": 4.5 },
                { "title": "Dune Messiah", "author": "Frank Herbert", "year": 1969, "genres": ["sf"], "rating": 3.5 },
            ],
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let data = body_json(response).await["data"].clone();
    let sf = data["communities"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["name"] == "sf")
        .unwrap()
        .clone();
    assert_eq!(sf["work_count"], 2);
    assert_eq!(sf["average_rating"], 4.0);
    assert_eq!(data["overlaps"][0]["overlap_score"], 1.0);
}

#[tokio::test]
async fn empty_community_request_is_a_validation_error() {
    let app = build_test_app();
    let response = post_json(app, "/analyze/communities", json!({ "works": [] })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["details"]["code"], "VALIDATION_ERROR");
}
