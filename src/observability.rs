use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::LazyLock;
use std::time::Instant;
use tracing::{info, warn};

/// Process-wide counters for the Artifact Fetcher's outbound adapter
/// calls. Per-evaluation budgets are tracked separately in
/// [`crate::budget::EvaluationBudget`]; these are aggregate,
/// cross-evaluation figures surfaced by `doctor`/logs.
#[derive(Debug, Default)]
pub struct AdapterMetrics {
    pub total_calls: AtomicU64,
    pub rate_limit_hits: AtomicU64,
    pub errors: AtomicU64,
    pub cache_hits: AtomicU64,
    pub cache_misses: AtomicU64,
}

impl AdapterMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_call(&self) {
        self.total_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rate_limit_hit(&self) {
        self.rate_limit_hits.fetch_add(1, Ordering::Relaxed);
        warn!("adapter rate limit hit");
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> AdapterMetricsSnapshot {
        AdapterMetricsSnapshot {
            total_calls: self.total_calls.load(Ordering::Relaxed),
            rate_limit_hits: self.rate_limit_hits.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
        }
    }

    pub fn log_snapshot(&self) {
        let s = self.snapshot();
        info!(
            "adapter metrics: calls={}, rate_limits={}, errors={}, cache_hits={}, cache_misses={}",
            s.total_calls, s.rate_limit_hits, s.errors, s.cache_hits, s.cache_misses
        );
    }
}

#[derive(Debug, Clone)]
pub struct AdapterMetricsSnapshot {
    pub total_calls: u64,
    pub rate_limit_hits: u64,
    pub errors: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
}

static ADAPTER_METRICS: LazyLock<AdapterMetrics> = LazyLock::new(AdapterMetrics::new);

pub fn adapter_metrics() -> &'static AdapterMetrics {
    &ADAPTER_METRICS
}

/// Process-wide counters for the Deduplication Index.
#[derive(Debug, Default)]
pub struct DedupMetrics {
    pub candidates_created: AtomicU64,
    pub duplicates_merged: AtomicU64,
    pub renotifications: AtomicU64,
}

impl DedupMetrics {
    pub fn record_created(&self) {
        self.candidates_created.fetch_add(1, Ordering::Relaxed);
    }
    pub fn record_merged(&self) {
        self.duplicates_merged.fetch_add(1, Ordering::Relaxed);
    }
    pub fn record_renotification(&self) {
        self.renotifications.fetch_add(1, Ordering::Relaxed);
    }
}

static DEDUP_METRICS: LazyLock<DedupMetrics> = LazyLock::new(DedupMetrics::default);

pub fn dedup_metrics() -> &'static DedupMetrics {
    &DEDUP_METRICS
}

/// Create a span correlating one pack-evaluation or drift-step run.
pub fn create_workflow_span(workflow: &str, correlation_id: &str) -> tracing::Span {
    tracing::info_span!(
        "workflow",
        workflow.name = workflow,
        correlation.id = correlation_id,
        otel.kind = "internal"
    )
}

/// Time an operation and log its duration on completion.
pub struct OperationTimer {
    operation: String,
    start: Instant,
}

impl OperationTimer {
    pub fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            start: Instant::now(),
        }
    }

    pub fn finish(self) -> u128 {
        let duration = self.start.elapsed();
        info!(
            operation = %self.operation,
            duration_ms = duration.as_millis(),
            "operation completed"
        );
        duration.as_millis()
    }
}
