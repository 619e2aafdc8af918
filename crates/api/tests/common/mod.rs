#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use sfmcp_api::config::ServerConfig;
use sfmcp_api::router::build_app_router;
use sfmcp_api::state::AppState;
use sfmcp_core::monitoring::SourceItem;
use sfmcp_core::prompts::Prompt;
use sfmcp_events::EmailDelivery;
use sfmcp_upstream::{
    DataSource, LlmClient, LlmCompletion, MonitorQuery, Operation, SourceRegistry, UpstreamError,
};

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:3000".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        cache_ttl_secs: 3600,
        notification_retention_days: 30,
        retention_interval_secs: 3600,
        upstream_timeout_secs: 5,
        parallel_branch_timeout_secs: 10,
        goodreads_api_key: None,
    }
}

// ---------------------------------------------------------------------------
// Fake LLM
// ---------------------------------------------------------------------------

/// Answers every prompt, or fails as temporarily unavailable when `failing`.
#[derive(Default)]
pub struct FakeLlm {
    pub calls: AtomicUsize,
    pub failing: bool,
}

impl FakeLlm {
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmClient for FakeLlm {
    fn resolve_model(&self, requested: Option<&str>) -> String {
        requested.unwrap_or("test/default-model").to_string()
    }

    async fn complete(&self, prompt: &Prompt, model: &str) -> Result<LlmCompletion, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(UpstreamError::TransientUnavailable {
                source_name: "openrouter",
                reason: "HTTP 429".into(),
                retry_after: Some(Duration::from_secs(7)),
            });
        }
        Ok(LlmCompletion {
            content: format!("Analysis ({} chars of input)", prompt.user.len()),
            model: model.to_string(),
            usage: None,
            finish_reason: Some("stop".into()),
        })
    }
}

// ---------------------------------------------------------------------------
// Fake sources
// ---------------------------------------------------------------------------

const BOOK_OPERATIONS: &[Operation] = &[Operation {
    name: "search",
    description: "Search books by title",
    required: &["query"],
    optional: &["limit"],
}];

/// Stands in for `openlibrary`: echoes the query and finds one cyberpunk novel.
#[derive(Default)]
pub struct FakeBooks {
    pub calls: AtomicUsize,
}

#[async_trait]
impl DataSource for FakeBooks {
    fn name(&self) -> &'static str {
        "openlibrary"
    }

    fn description(&self) -> &'static str {
        "Fake book catalogue"
    }

    fn operations(&self) -> &'static [Operation] {
        BOOK_OPERATIONS
    }

    async fn fetch(&self, operation: &str, params: &Value) -> Result<Value, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match operation {
            "search" => Ok(json!({
                "query": params["query"],
                "results": [{ "title": "Neuromancer", "author": "William Gibson" }],
            })),
            other => Err(self.unsupported(other)),
        }
    }

    async fn find_items(&self, query: &MonitorQuery) -> Result<Vec<SourceItem>, UpstreamError> {
        match query {
            MonitorQuery::Keyword(_) => Ok(vec![SourceItem {
                source: "openlibrary".into(),
                id: "OL27258W".into(),
                title: Some("Neuromancer".into()),
                author: Some("William Gibson".into()),
                description: Some("The cyberpunk classic".into()),
                url: None,
            }]),
            MonitorQuery::Author(_) => Ok(Vec::new()),
        }
    }
}

const WIKI_OPERATIONS: &[Operation] = &[Operation {
    name: "summary",
    description: "Article summary",
    required: &["title"],
    optional: &[],
}];

/// Stands in for `wikipedia`: always rate limited.
pub struct RateLimitedWiki;

#[async_trait]
impl DataSource for RateLimitedWiki {
    fn name(&self) -> &'static str {
        "wikipedia"
    }

    fn description(&self) -> &'static str {
        "Always rate limited"
    }

    fn operations(&self) -> &'static [Operation] {
        WIKI_OPERATIONS
    }

    async fn fetch(&self, _operation: &str, _params: &Value) -> Result<Value, UpstreamError> {
        Err(UpstreamError::TransientUnavailable {
            source_name: "wikipedia",
            reason: "HTTP 429".into(),
            retry_after: Some(Duration::from_secs(12)),
        })
    }
}

// ---------------------------------------------------------------------------
// App builders
// ---------------------------------------------------------------------------

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub llm: Arc<FakeLlm>,
    pub books: Arc<FakeBooks>,
}

/// Build the full application router over fakes, keeping handles to them.
pub fn build_test_app_with(llm: FakeLlm) -> TestApp {
    let config = test_config();
    let llm = Arc::new(llm);
    let books = Arc::new(FakeBooks::default());

    let mut sources = SourceRegistry::new();
    sources.register(books.clone());
    sources.register(Arc::new(RateLimitedWiki));

    let state = AppState::new(
        config.clone(),
        llm.clone(),
        sources,
        Arc::new(EmailDelivery::new(None)),
    );
    let router = build_app_router(state.clone(), &config);

    TestApp {
        router,
        state,
        llm,
        books,
    }
}

/// Build the full application router with a working fake LLM.
pub fn build_test_app() -> Router {
    build_test_app_with(FakeLlm::default()).router
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_empty(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn delete(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}
