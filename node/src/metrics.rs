//! Prometheus metrics for the node.
//!
//! The [`NodeMetrics`] struct owns a dedicated [`Registry`] that the HTTP
//! `/metrics` endpoint encodes into the Prometheus text exposition format.

use prometheus::{
    register_histogram_with_registry, register_int_counter_with_registry,
    register_int_gauge_with_registry, Encoder, Histogram, HistogramOpts, IntCounter, IntGauge,
    Opts, Registry, TextEncoder,
};

/// Central collection of all node-level Prometheus metrics.
pub struct NodeMetrics {
    /// The Prometheus registry that owns every metric below.
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Increments accepted.
    pub increments: IntCounter,
    /// Reports computed.
    pub reports: IntCounter,
    /// Snapshots written successfully.
    pub flushes: IntCounter,
    /// Snapshot writes that failed.
    pub flush_failures: IntCounter,

    // ── Gauges ──────────────────────────────────────────────────────────
    /// Size of the last written snapshot.
    pub snapshot_bytes: IntGauge,

    // ── Histograms ──────────────────────────────────────────────────────
    /// Time spent encoding and writing one snapshot, in milliseconds.
    pub flush_duration_ms: Histogram,
}

impl NodeMetrics {
    /// Create a fresh set of metrics, all registered under a new
    /// [`Registry`].
    pub fn new() -> Self {
        let registry = Registry::new();

        let increments = register_int_counter_with_registry!(
            Opts::new("hstats_increments_total", "Total counter increments"),
            registry
        )
        .expect("failed to register increments counter");

        let reports = register_int_counter_with_registry!(
            Opts::new("hstats_reports_total", "Total reports computed"),
            registry
        )
        .expect("failed to register reports counter");

        let flushes = register_int_counter_with_registry!(
            Opts::new("hstats_flushes_total", "Total snapshots written"),
            registry
        )
        .expect("failed to register flushes counter");

        let flush_failures = register_int_counter_with_registry!(
            Opts::new(
                "hstats_flush_failures_total",
                "Total snapshot writes that failed"
            ),
            registry
        )
        .expect("failed to register flush_failures counter");

        let snapshot_bytes = register_int_gauge_with_registry!(
            Opts::new("hstats_snapshot_bytes", "Size of the last written snapshot"),
            registry
        )
        .expect("failed to register snapshot_bytes gauge");

        // 0.5 ms → ~8 s
        let flush_duration_ms = register_histogram_with_registry!(
            HistogramOpts::new(
                "hstats_flush_duration_ms",
                "Snapshot encode and write time in milliseconds"
            )
            .buckets(
                prometheus::exponential_buckets(0.5, 2.0, 15)
                    .expect("valid exponential bucket parameters")
            ),
            registry
        )
        .expect("failed to register flush_duration_ms histogram");

        Self {
            registry,
            increments,
            reports,
            flushes,
            flush_failures,
            snapshot_bytes,
            flush_duration_ms,
        }
    }

    /// Encode every metric in the text exposition format.
    pub fn render(&self) -> String {
        let mut buf = Vec::new();
        if let Err(e) = TextEncoder::new().encode(&self.registry.gather(), &mut buf) {
            tracing::warn!("failed to encode metrics: {e}");
        }
        String::from_utf8(buf).unwrap_or_default()
    }
}

impl Default for NodeMetrics {
    fn default() -> Self {
        Self::new()
    }
}
