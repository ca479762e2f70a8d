//! The two operations the transport needs from the counter engine.

use hstats_stats::{Report, Stats};

/// Bridges the HTTP layer to whatever owns the counters, without the RPC
/// crate depending on the persistence layer.
pub trait CounterService: Send + Sync + 'static {
    /// Count one event for a `bucket.key` reference. Never fails.
    fn incr(&self, reference: &str);

    /// Report for one top-level bucket; unknown buckets yield an empty report.
    fn report(&self, bucket: &str) -> Report;

    /// Prometheus text exposition, if the service keeps metrics.
    fn render_metrics(&self) -> Option<String> {
        None
    }
}

impl CounterService for Stats {
    fn incr(&self, reference: &str) {
        Stats::incr(self, reference);
    }

    fn report(&self, bucket: &str) -> Report {
        Stats::report(self, bucket)
    }
}
