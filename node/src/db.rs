//! Persistence manager: the process-wide counters plus their snapshot slot.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use hstats_rpc::CounterService;
use hstats_stats::{Report, Stats};
use hstats_store::SnapshotStore;
use hstats_store_lmdb::LmdbSnapshotStore;
use hstats_types::{Clock, SystemClock};

use crate::{NodeConfig, NodeError, NodeMetrics, ShutdownController};

/// Period between snapshot flushes when none is configured.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(600);

/// How long `close` waits for the periodic flusher to notice cancellation.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

struct Inner {
    stats: Stats,
    store: Arc<dyn SnapshotStore>,
    /// Serializes snapshot writes.
    flush_guard: Mutex<()>,
    /// Set by the final flush; no snapshot is written afterwards.
    sealed: AtomicBool,
    metrics: NodeMetrics,
}

impl Inner {
    fn flush(&self) -> Result<usize, NodeError> {
        let _guard = self.flush_guard.lock();
        if self.sealed.load(Ordering::Acquire) {
            return Err(NodeError::Closed);
        }
        self.write_snapshot()
    }

    fn final_flush(&self) -> Result<usize, NodeError> {
        let _guard = self.flush_guard.lock();
        if self.sealed.swap(true, Ordering::AcqRel) {
            return Err(NodeError::Closed);
        }
        self.write_snapshot()
    }

    /// Caller holds `flush_guard`.
    fn write_snapshot(&self) -> Result<usize, NodeError> {
        let started = Instant::now();
        let result = self
            .stats
            .dump()
            .map_err(NodeError::from)
            .and_then(|bytes| {
                self.store.store_snapshot(&bytes)?;
                Ok(bytes.len())
            });

        self.metrics
            .flush_duration_ms
            .observe(started.elapsed().as_secs_f64() * 1000.0);
        match &result {
            Ok(len) => {
                self.metrics.flushes.inc();
                self.metrics.snapshot_bytes.set(*len as i64);
            }
            Err(_) => self.metrics.flush_failures.inc(),
        }
        result
    }
}

/// Owns the counter root and writes it to a [`SnapshotStore`] periodically
/// and once more on [`close`](Self::close).
///
/// Increments and reports never touch the store. They keep working after
/// `close`, in memory only.
pub struct StatsDb {
    inner: Arc<Inner>,
    shutdown: ShutdownController,
    flusher: Mutex<Option<JoinHandle<()>>>,
    closing: AtomicBool,
}

impl StatsDb {
    /// Restore the counters from the latest snapshot in `store`.
    ///
    /// An empty store yields an empty root. A snapshot that cannot be decoded
    /// is an error: starting empty would overwrite it on the next flush.
    pub fn open(store: Arc<dyn SnapshotStore>, clock: Arc<dyn Clock>) -> Result<Self, NodeError> {
        let stats = match store.load_latest_snapshot()? {
            Some(bytes) => {
                let stats = Stats::load(&bytes, clock)?;
                tracing::info!(
                    bytes = bytes.len(),
                    buckets = stats.bucket_names().len(),
                    "restored counters from snapshot"
                );
                stats
            }
            None => {
                tracing::info!("no snapshot found, starting empty");
                Stats::with_clock(clock)
            }
        };

        Ok(Self {
            inner: Arc::new(Inner {
                stats,
                store,
                flush_guard: Mutex::new(()),
                sealed: AtomicBool::new(false),
                metrics: NodeMetrics::new(),
            }),
            shutdown: ShutdownController::new(),
            flusher: Mutex::new(None),
            closing: AtomicBool::new(false),
        })
    }

    /// Open the LMDB environment at `config.db_path` and restore from it.
    pub fn open_lmdb(config: &NodeConfig) -> Result<Self, NodeError> {
        let store = LmdbSnapshotStore::open(&config.db_path, config.map_size_bytes())?;
        tracing::info!(path = %config.db_path.display(), "opened LMDB snapshot store");
        Self::open(Arc::new(store), Arc::new(SystemClock))
    }

    pub fn stats(&self) -> &Stats {
        &self.inner.stats
    }

    pub fn metrics(&self) -> &NodeMetrics {
        &self.inner.metrics
    }

    pub fn incr(&self, reference: &str) {
        self.inner.stats.incr(reference);
        self.inner.metrics.increments.inc();
    }

    pub fn report(&self, bucket: &str) -> Report {
        self.inner.metrics.reports.inc();
        self.inner.stats.report(bucket)
    }

    pub fn report_all(&self) -> Report {
        self.inner.metrics.reports.inc();
        self.inner.stats.report_all()
    }

    /// Write a snapshot now. Returns the number of bytes written.
    ///
    /// Blocks on store I/O; async callers should go through
    /// `spawn_blocking`.
    pub fn flush(&self) -> Result<usize, NodeError> {
        self.inner.flush()
    }

    /// Spawn the periodic flusher. The first flush happens one full
    /// `interval` after this call.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self, interval: Duration) {
        if self.closing.load(Ordering::Acquire) {
            tracing::warn!("persistence manager already closed, not starting flusher");
            return;
        }
        let mut flusher = self.flusher.lock();
        if flusher.is_some() {
            tracing::warn!("periodic flusher already running");
            return;
        }

        let inner = Arc::clone(&self.inner);
        let mut shutdown_rx = self.shutdown.subscribe();
        *flusher = Some(tokio::spawn(async move {
            let mut ticker =
                tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.recv() => {
                        tracing::debug!("periodic flusher shutting down");
                        break;
                    }
                    _ = ticker.tick() => {
                        let inner = Arc::clone(&inner);
                        match tokio::task::spawn_blocking(move || inner.flush()).await {
                            Ok(Ok(bytes)) => tracing::debug!(bytes, "periodic snapshot written"),
                            Ok(Err(NodeError::Closed)) => break,
                            Ok(Err(e)) => tracing::error!("periodic snapshot failed: {e}"),
                            Err(e) => tracing::error!("periodic snapshot task failed: {e}"),
                        }
                    }
                }
            }
        }));
        tracing::info!(interval_secs = interval.as_secs(), "periodic flusher started");
    }

    /// Stop the flusher, write one final snapshot, then release the store.
    ///
    /// A failed final flush is returned; the store is released regardless.
    /// Calling `close` again does nothing.
    pub async fn close(&self) -> Result<(), NodeError> {
        if self.closing.swap(true, Ordering::AcqRel) {
            tracing::debug!("persistence manager already closed");
            return Ok(());
        }

        self.shutdown.shutdown();
        let handle = self.flusher.lock().take();
        if let Some(mut handle) = handle {
            match tokio::time::timeout(SHUTDOWN_TIMEOUT, &mut handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::error!("periodic flusher failed: {e}"),
                Err(_) => {
                    tracing::warn!(
                        timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
                        "periodic flusher did not stop in time, aborting"
                    );
                    handle.abort();
                }
            }
        }

        let inner = Arc::clone(&self.inner);
        let flushed = tokio::task::spawn_blocking(move || {
            let flushed = inner.final_flush();
            let released = inner.store.close();
            (flushed, released)
        })
        .await
        .map_err(|e| NodeError::Task(e.to_string()))?;

        match flushed {
            (Ok(bytes), released) => {
                tracing::info!(bytes, "final snapshot written");
                released?;
                Ok(())
            }
            (Err(e), released) => {
                tracing::error!("final snapshot failed: {e}");
                if let Err(release_err) = released {
                    tracing::warn!("failed to release snapshot store: {release_err}");
                }
                Err(e)
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closing.load(Ordering::Acquire)
    }
}

impl CounterService for StatsDb {
    fn incr(&self, reference: &str) {
        StatsDb::incr(self, reference);
    }

    fn report(&self, bucket: &str) -> Report {
        StatsDb::report(self, bucket)
    }

    fn render_metrics(&self) -> Option<String> {
        Some(self.inner.metrics.render())
    }
}
