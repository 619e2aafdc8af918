use std::sync::Arc;

use sfmcp_events::{EmailDelivery, EventBus};
use sfmcp_store::{CacheStore, MemoryCacheStore, MonitoringStore};
use sfmcp_upstream::{LlmClient, SourceRegistry};

use crate::config::ServerConfig;
use crate::engine::dispatcher::AnalysisDispatcher;
use crate::engine::monitoring::ProfileChecker;
use crate::engine::parallel::{ParallelHarness, ParallelMetrics};
use crate::visualization::{ChartRenderer, SvgRenderer};

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Fingerprint-keyed response cache.
    pub cache: Arc<dyn CacheStore>,
    /// LLM router used by every analysis endpoint.
    pub llm: Arc<dyn LlmClient>,
    /// The bibliographic and media sources, by name.
    pub sources: Arc<SourceRegistry>,
    /// Interest profiles, notifications and webhook registrations.
    pub monitoring: Arc<MonitoringStore>,
    /// Publishes monitoring events to the delivery router.
    pub event_bus: Arc<EventBus>,
    /// SMTP sink; its configuration can be replaced at runtime.
    pub email: Arc<EmailDelivery>,
    /// Counters for the original-vs-mcp harness.
    pub parallel_metrics: Arc<ParallelMetrics>,
    pub renderer: Arc<dyn ChartRenderer>,
}

impl AppState {
    /// Build state with in-memory stores and the SVG renderer.
    pub fn new(
        config: ServerConfig,
        llm: Arc<dyn LlmClient>,
        sources: SourceRegistry,
        email: Arc<EmailDelivery>,
    ) -> Self {
        let cache = Arc::new(MemoryCacheStore::new(config.cache_ttl()));
        Self {
            config: Arc::new(config),
            cache,
            llm,
            sources: Arc::new(sources),
            monitoring: Arc::new(MonitoringStore::default()),
            event_bus: Arc::new(EventBus::default()),
            email,
            parallel_metrics: Arc::new(ParallelMetrics::new()),
            renderer: Arc::new(SvgRenderer::new()),
        }
    }

    pub fn dispatcher(&self) -> AnalysisDispatcher {
        AnalysisDispatcher::new(Arc::clone(&self.cache), Arc::clone(&self.llm))
    }

    pub fn harness(&self) -> ParallelHarness {
        ParallelHarness::new(
            self.dispatcher(),
            Arc::clone(&self.parallel_metrics),
            self.config.parallel_branch_timeout(),
        )
    }

    pub fn checker(&self) -> ProfileChecker {
        ProfileChecker::new(
            Arc::clone(&self.sources),
            Arc::clone(&self.monitoring),
            Arc::clone(&self.event_bus),
        )
    }
}
