//! Cache-then-LLM analysis dispatcher.
//!
//! Every analysis endpoint builds an [`AnalysisJob`] (fingerprint, prompt,
//! result type) after validating its request, then hands it to
//! [`AnalysisDispatcher::dispatch`]:
//!
//! 1. the resolved model is added to the fingerprint,
//! 2. unless `force_refresh` is set the cache is consulted and a hit is
//!    returned as-is,
//! 3. on a miss the LLM backend is called, the result is wrapped and stored.
//!
//! LLM failures are returned to the caller and never cached.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{Map, Value};
use sfmcp_core::domain::ResultType;
use sfmcp_core::fingerprint::{CacheKey, Fingerprint};
use sfmcp_core::prompts::Prompt;
use sfmcp_store::CacheStore;
use sfmcp_upstream::{LlmClient, LlmCompletion};

use crate::error::AppResult;
use crate::response::{with_metadata, ResponseMetadata};

/// `metadata.source` of LLM-backed responses.
pub const LLM_SOURCE: &str = "openrouter";

/// One unit of work for the dispatcher.
#[derive(Debug, Clone)]
pub struct AnalysisJob {
    /// Namespace plus normalized request fields; the model is added later.
    pub fingerprint: Fingerprint,
    pub prompt: Prompt,
    pub result_type: ResultType,
    pub model: Option<String>,
    pub force_refresh: bool,
    /// Extra top-level fields merged into the result (echoed request data, tags).
    pub extra: Map<String, Value>,
}

impl AnalysisJob {
    pub fn new(fingerprint: Fingerprint, prompt: Prompt, result_type: ResultType) -> Self {
        Self {
            fingerprint,
            prompt,
            result_type,
            model: None,
            force_refresh: false,
            extra: Map::new(),
        }
    }

    pub fn model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    pub fn force_refresh(mut self, force_refresh: bool) -> Self {
        self.force_refresh = force_refresh;
        self
    }

    pub fn extra(mut self, extra: Map<String, Value>) -> Self {
        self.extra.extend(extra);
        self
    }
}

/// A dispatched analysis and where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatched {
    pub result: Value,
    pub cache_hit: bool,
    pub model: String,
    pub key: CacheKey,
}

impl Dispatched {
    /// The result with `metadata` appended, as served over HTTP.
    pub fn into_body(self) -> Value {
        let metadata = ResponseMetadata::new(LLM_SOURCE, self.cache_hit).with_model(self.model);
        with_metadata(self.result, &metadata)
    }
}

#[derive(Clone)]
pub struct AnalysisDispatcher {
    cache: Arc<dyn CacheStore>,
    llm: Arc<dyn LlmClient>,
}

impl AnalysisDispatcher {
    pub fn new(cache: Arc<dyn CacheStore>, llm: Arc<dyn LlmClient>) -> Self {
        Self { cache, llm }
    }

    pub async fn dispatch(&self, job: AnalysisJob) -> AppResult<Dispatched> {
        let model = self.llm.resolve_model(job.model.as_deref());
        let key = job.fingerprint.text("model", Some(&model)).finish();

        if !job.force_refresh {
            match self.cache.get(&key).await {
                Ok(Some(cached)) => {
                    tracing::debug!(key = %key, "Analysis served from cache");
                    return Ok(Dispatched {
                        result: cached.value,
                        cache_hit: true,
                        model,
                        key,
                    });
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Cache lookup failed, treating as miss");
                }
            }
        }

        let completion = self.llm.complete(&job.prompt, &model).await?;
        tracing::info!(
            key = %key,
            model = %completion.model,
            result_type = ?job.result_type,
            "Analysis completed"
        );

        let result = build_result(job.result_type, completion, job.extra);
        if let Err(e) = self.cache.put(&key, result.clone()).await {
            tracing::warn!(key = %key, error = %e, "Failed to store analysis in cache");
        }

        Ok(Dispatched {
            result,
            cache_hit: false,
            model,
            key,
        })
    }
}

/// `{type, timestamp, analysis, ...extra}`.
fn build_result(result_type: ResultType, completion: LlmCompletion, extra: Map<String, Value>) -> Value {
    let mut map = Map::new();
    map.insert(
        "type".into(),
        serde_json::to_value(result_type).unwrap_or(Value::Null),
    );
    map.insert("timestamp".into(), Value::String(Utc::now().to_rfc3339()));
    map.insert(
        "analysis".into(),
        serde_json::to_value(&completion).unwrap_or(Value::Null),
    );
    for (k, v) in extra {
        map.entry(k).or_insert(v);
    }
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sfmcp_store::MemoryCacheStore;
    use sfmcp_upstream::UpstreamError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Counts calls and fails when `fail` is set.
    #[derive(Default)]
    struct CountingLlm {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl LlmClient for CountingLlm {
        fn resolve_model(&self, requested: Option<&str>) -> String {
            requested.unwrap_or("default-model").to_string()
        }

        async fn complete(&self, prompt: &Prompt, model: &str) -> Result<LlmCompletion, UpstreamError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(UpstreamError::TransientUnavailable {
                    source_name: "openrouter",
                    reason: "HTTP 503".into(),
                    retry_after: None,
                });
            }
            Ok(LlmCompletion {
                content: format!("analysis of {}", prompt.user.len()),
                model: model.to_string(),
                usage: None,
                finish_reason: Some("stop".into()),
            })
        }
    }

    fn dispatcher(llm: Arc<CountingLlm>) -> (AnalysisDispatcher, Arc<MemoryCacheStore>) {
        let cache = Arc::new(MemoryCacheStore::new(Duration::from_secs(3600)));
        (AnalysisDispatcher::new(cache.clone(), llm), cache)
    }

    fn job() -> AnalysisJob {
        AnalysisJob::new(
            Fingerprint::new("analyze:sf").text("content", Some("The spice must flow")),
            Prompt::new("system", "The spice must flow"),
            ResultType::Sf,
        )
    }

    #[tokio::test]
    async fn second_call_is_a_cache_hit() {
        let llm = Arc::new(CountingLlm::default());
        let (dispatcher, _) = dispatcher(llm.clone());

        let first = dispatcher.dispatch(job()).await.unwrap();
        let second = dispatcher.dispatch(job()).await.unwrap();

        assert!(!first.cache_hit);
        assert!(second.cache_hit);
        assert_eq!(first.result, second.result);
        assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
        assert_eq!(first.result["type"], "sf");
        assert_eq!(first.result["analysis"]["model"], "default-model");
    }

    #[tokio::test]
    async fn force_refresh_skips_lookup_but_still_writes() {
        let llm = Arc::new(CountingLlm::default());
        let (dispatcher, cache) = dispatcher(llm.clone());

        dispatcher.dispatch(job()).await.unwrap();
        let refreshed = dispatcher.dispatch(job().force_refresh(true)).await.unwrap();

        assert!(!refreshed.cache_hit);
        assert_eq!(llm.calls.load(Ordering::SeqCst), 2);
        let stats = cache.stats().await;
        assert_eq!(stats.writes, 2);
        assert_eq!(stats.hits + stats.misses, 1);
    }

    #[tokio::test]
    async fn model_is_part_of_the_key() {
        let llm = Arc::new(CountingLlm::default());
        let (dispatcher, _) = dispatcher(llm.clone());

        let a = dispatcher.dispatch(job()).await.unwrap();
        let b = dispatcher
            .dispatch(job().model(Some("other/model".into())))
            .await
            .unwrap();

        assert_ne!(a.key, b.key);
        assert!(!b.cache_hit);
        assert_eq!(llm.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let llm = Arc::new(CountingLlm { fail: true, ..Default::default() });
        let (dispatcher, cache) = dispatcher(llm);

        assert!(dispatcher.dispatch(job()).await.is_err());
        assert_eq!(cache.stats().await.writes, 0);
    }

    #[tokio::test]
    async fn extra_fields_are_merged_and_body_has_metadata() {
        let llm = Arc::new(CountingLlm::default());
        let (dispatcher, _) = dispatcher(llm);

        let mut extra = Map::new();
        extra.insert("title".into(), Value::from("Dune"));
        let body = dispatcher.dispatch(job().extra(extra)).await.unwrap().into_body();

        assert_eq!(body["title"], "Dune");
        assert_eq!(body["metadata"]["source"], LLM_SOURCE);
        assert_eq!(body["metadata"]["cache_hit"], false);
    }
}
