//! Counters for service monitoring.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use fxwatch_fx::RefreshSummary;

/// Service metrics.
#[derive(Default)]
pub struct Metrics {
    /// Refresh cycles completed.
    pub refresh_cycles: AtomicU64,
    /// Triggers dropped because a cycle was already running.
    pub refresh_coalesced: AtomicU64,
    /// Quotes returned by providers.
    pub quotes_observed: AtomicU64,
    /// Best rates written to the cache.
    pub rates_published: AtomicU64,
    /// Provider calls that failed or timed out.
    pub provider_failures: AtomicU64,
    /// Observation batches the store rejected.
    pub store_failures: AtomicU64,
    /// Conversions served.
    pub conversions: AtomicU64,
    /// Trend and history queries served.
    pub trend_queries: AtomicU64,
    /// Queries that returned an error.
    pub query_failures: AtomicU64,
}

impl Metrics {
    /// Create new metrics instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a finished refresh cycle into the counters.
    pub fn record_refresh(&self, summary: &RefreshSummary) {
        self.refresh_cycles.fetch_add(1, Ordering::Relaxed);
        self.quotes_observed
            .fetch_add(summary.quotes_observed as u64, Ordering::Relaxed);
        self.rates_published
            .fetch_add(summary.rates_published as u64, Ordering::Relaxed);
        self.provider_failures
            .fetch_add(summary.provider_failures as u64, Ordering::Relaxed);
        self.store_failures
            .fetch_add(summary.store_failures as u64, Ordering::Relaxed);
    }

    pub fn refresh_coalesced(&self) {
        self.refresh_coalesced.fetch_add(1, Ordering::Relaxed);
    }

    pub fn conversion(&self) {
        self.conversions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn trend_query(&self) {
        self.trend_queries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn query_failed(&self) {
        self.query_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            refresh_cycles: self.refresh_cycles.load(Ordering::Relaxed),
            refresh_coalesced: self.refresh_coalesced.load(Ordering::Relaxed),
            quotes_observed: self.quotes_observed.load(Ordering::Relaxed),
            rates_published: self.rates_published.load(Ordering::Relaxed),
            provider_failures: self.provider_failures.load(Ordering::Relaxed),
            store_failures: self.store_failures.load(Ordering::Relaxed),
            conversions: self.conversions.load(Ordering::Relaxed),
            trend_queries: self.trend_queries.load(Ordering::Relaxed),
            query_failures: self.query_failures.load(Ordering::Relaxed),
        }
    }

    /// Export metrics in Prometheus format.
    pub fn to_prometheus(&self) -> String {
        let snapshot = self.snapshot();
        let counters = [
            ("refresh_cycles_total", "Refresh cycles completed", snapshot.refresh_cycles),
            ("refresh_coalesced_total", "Refresh triggers coalesced", snapshot.refresh_coalesced),
            ("quotes_observed_total", "Provider quotes observed", snapshot.quotes_observed),
            ("rates_published_total", "Best rates published to the cache", snapshot.rates_published),
            ("provider_failures_total", "Failed provider calls", snapshot.provider_failures),
            ("store_failures_total", "Rejected observation batches", snapshot.store_failures),
            ("conversions_total", "Conversions served", snapshot.conversions),
            ("trend_queries_total", "Trend and history queries served", snapshot.trend_queries),
            ("query_failures_total", "Failed queries", snapshot.query_failures),
        ];

        let mut out = String::new();
        for (name, help, value) in counters {
            out.push_str(&format!(
                "# HELP fxwatch_{name} {help}\n# TYPE fxwatch_{name} counter\nfxwatch_{name} {value}\n\n"
            ));
        }
        out
    }
}

/// Snapshot of metrics at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub refresh_cycles: u64,
    pub refresh_coalesced: u64,
    pub quotes_observed: u64,
    pub rates_published: u64,
    pub provider_failures: u64,
    pub store_failures: u64,
    pub conversions: u64,
    pub trend_queries: u64,
    pub query_failures: u64,
}

/// Shared metrics instance.
pub type SharedMetrics = Arc<Metrics>;
