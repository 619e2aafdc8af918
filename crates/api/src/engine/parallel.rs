//! Original-vs-mcp execution harness.
//!
//! [`ParallelHarness::run`] executes the pipelines selected by an
//! [`ExecutionMode`]. In `parallel` mode both branches are joined; a failing
//! branch never cancels the other. Each branch has its own timeout and is
//! recorded in [`ParallelMetrics`] exactly once. A key-level comparison is
//! produced only when both branches succeeded.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use sfmcp_core::diff::{compare_results, ResultComparison};
use sfmcp_core::domain::Genre;
use sfmcp_core::execution::ExecutionMode;
use sfmcp_core::requests::AnalysisRequest;
use sfmcp_core::types::Timestamp;
use sfmcp_upstream::UpstreamError;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::engine::dispatcher::AnalysisDispatcher;
use crate::engine::pipeline::Pipeline;
use crate::error::AppError;

/// Most recent errors kept per branch.
const MAX_RECENT_ERRORS: usize = 50;

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct BranchError {
    pub timestamp: Timestamp,
    pub error: String,
}

#[derive(Debug, Default)]
struct BranchCounters {
    calls: u64,
    successes: u64,
    errors: VecDeque<BranchError>,
    durations: DurationStats,
}

/// Running duration aggregate; constant size however many calls are made.
#[derive(Debug, Default)]
struct DurationStats {
    count: usize,
    total_ms: u64,
    min_ms: u64,
    max_ms: u64,
}

impl DurationStats {
    fn add(&mut self, duration_ms: u64) {
        if self.count == 0 {
            self.min_ms = duration_ms;
            self.max_ms = duration_ms;
        } else {
            self.min_ms = self.min_ms.min(duration_ms);
            self.max_ms = self.max_ms.max(duration_ms);
        }
        self.count += 1;
        self.total_ms = self.total_ms.saturating_add(duration_ms);
    }

    fn stats(&self) -> Option<PerformanceStats> {
        (self.count > 0).then(|| PerformanceStats {
            min_ms: self.min_ms,
            max_ms: self.max_ms,
            avg_ms: self.total_ms as f64 / self.count as f64,
            count: self.count,
        })
    }
}

impl BranchCounters {
    fn record(&mut self, duration_ms: u64, error: Option<String>) {
        self.calls += 1;
        self.durations.add(duration_ms);
        match error {
            None => self.successes += 1,
            Some(error) => {
                if self.errors.len() == MAX_RECENT_ERRORS {
                    self.errors.pop_front();
                }
                self.errors.push_back(BranchError {
                    timestamp: Utc::now(),
                    error,
                });
            }
        }
    }

    fn snapshot(&self) -> BranchMetrics {
        BranchMetrics {
            calls: self.calls,
            successes: self.successes,
            success_rate: if self.calls > 0 {
                self.successes as f64 / self.calls as f64
            } else {
                0.0
            },
            recent_errors: self.errors.iter().cloned().collect(),
            performance: self.durations.stats(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PerformanceStats {
    pub min_ms: u64,
    pub max_ms: u64,
    pub avg_ms: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct BranchMetrics {
    pub calls: u64,
    pub successes: u64,
    pub success_rate: f64,
    pub recent_errors: Vec<BranchError>,
    pub performance: Option<PerformanceStats>,
}

/// Served by `GET /analyze/parallel/metrics`.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub started_at: Timestamp,
    pub parallel_calls: u64,
    pub original: BranchMetrics,
    pub mcp: BranchMetrics,
}

#[derive(Debug, Default)]
struct MetricsState {
    parallel_calls: u64,
    original: BranchCounters,
    mcp: BranchCounters,
}

/// Process-wide harness counters.
pub struct ParallelMetrics {
    started_at: Timestamp,
    state: RwLock<MetricsState>,
}

impl ParallelMetrics {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            state: RwLock::new(MetricsState::default()),
        }
    }

    pub async fn record_parallel_call(&self) {
        self.state.write().await.parallel_calls += 1;
    }

    pub async fn record_branch(&self, pipeline: Pipeline, duration_ms: u64, error: Option<String>) {
        let mut state = self.state.write().await;
        match pipeline {
            Pipeline::Original => state.original.record(duration_ms, error),
            Pipeline::Mcp => state.mcp.record(duration_ms, error),
        }
    }

    pub async fn snapshot(&self) -> MetricsSnapshot {
        let state = self.state.read().await;
        MetricsSnapshot {
            started_at: self.started_at,
            parallel_calls: state.parallel_calls,
            original: state.original.snapshot(),
            mcp: state.mcp.snapshot(),
        }
    }
}

impl Default for ParallelMetrics {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

/// What one branch produced.
#[derive(Debug, Clone, Serialize)]
pub struct BranchOutcome {
    pub success: bool,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_hit: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParallelOutcome {
    pub mode: ExecutionMode,
    pub genre: Genre,
    pub original: Option<BranchOutcome>,
    pub mcp: Option<BranchOutcome>,
    pub comparison: Option<ResultComparison>,
}

pub struct ParallelHarness {
    dispatcher: AnalysisDispatcher,
    metrics: Arc<ParallelMetrics>,
    branch_timeout: Duration,
}

impl ParallelHarness {
    pub fn new(
        dispatcher: AnalysisDispatcher,
        metrics: Arc<ParallelMetrics>,
        branch_timeout: Duration,
    ) -> Self {
        Self {
            dispatcher,
            metrics,
            branch_timeout,
        }
    }

    /// Run the pipelines selected by `mode` on an already validated request.
    pub async fn run(
        &self,
        mode: ExecutionMode,
        genre: Genre,
        request: &AnalysisRequest,
    ) -> ParallelOutcome {
        if mode == ExecutionMode::Parallel {
            self.metrics.record_parallel_call().await;
        }

        let original = async {
            if mode.runs_original() {
                Some(self.branch(Pipeline::Original, genre, request).await)
            } else {
                None
            }
        };
        let mcp = async {
            if mode.runs_mcp() {
                Some(self.branch(Pipeline::Mcp, genre, request).await)
            } else {
                None
            }
        };
        let (original, mcp) = tokio::join!(original, mcp);

        let comparison = match (&original, &mcp) {
            (
                Some(BranchOutcome { result: Some(o), .. }),
                Some(BranchOutcome { result: Some(m), .. }),
            ) => Some(compare_results(o, m)),
            _ => None,
        };
        if let Some(c) = &comparison {
            tracing::info!(genre = %genre, summary = %c.summary(), "Parallel analysis compared");
        }

        ParallelOutcome {
            mode,
            genre,
            original,
            mcp,
            comparison,
        }
    }

    async fn branch(&self, pipeline: Pipeline, genre: Genre, request: &AnalysisRequest) -> BranchOutcome {
        let started = Instant::now();
        let outcome = tokio::time::timeout(
            self.branch_timeout,
            pipeline.run(&self.dispatcher, genre, request),
        )
        .await
        .unwrap_or_else(|_| {
            Err(AppError::Upstream(UpstreamError::TransientUnavailable {
                source_name: "parallel",
                reason: format!(
                    "{} branch timed out after {}s",
                    pipeline.as_str(),
                    self.branch_timeout.as_secs()
                ),
                retry_after: None,
            }))
        });
        let duration_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(dispatched) => {
                self.metrics.record_branch(pipeline, duration_ms, None).await;
                BranchOutcome {
                    success: true,
                    duration_ms,
                    cache_hit: Some(dispatched.cache_hit),
                    result: Some(dispatched.result),
                    error: None,
                }
            }
            Err(e) => {
                let error = e.to_string();
                tracing::warn!(pipeline = pipeline.as_str(), error = %error, "Parallel branch failed");
                self.metrics
                    .record_branch(pipeline, duration_ms, Some(error.clone()))
                    .await;
                BranchOutcome {
                    success: false,
                    duration_ms,
                    cache_hit: None,
                    result: None,
                    error: Some(error),
                }
            }
        }
    }
}
