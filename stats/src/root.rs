//! Aggregation root: the whole process-wide counter state.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use hstats_types::{Clock, HourKey, Reference, SystemClock};

use crate::bucket::Bucket;
use crate::hourly::Hourly;
use crate::nested::with_child;
use crate::report::Report;
use crate::snapshot::{self, SnapshotV1};
use crate::SnapshotError;

/// Top-level bucket name → [`Bucket`].
///
/// Increments and reports take the locks of the levels they pass through in
/// root → bucket → hourly order. Only inserting a missing bucket or sub-key
/// takes a level's lock exclusively, so increments to different counters run
/// in parallel.
///
/// A report over several buckets is not a point-in-time snapshot: counters
/// may move between the moment one bucket is read and the next.
pub struct Stats {
    buckets: RwLock<HashMap<String, Bucket>>,
    clock: Arc<dyn Clock>,
}

impl Stats {
    /// Empty root on the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            buckets: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Count one event for `reference` in the current hour.
    pub fn incr(&self, reference: &str) {
        self.incr_at(reference, self.clock.now());
    }

    /// Count one event for `reference` in the hour containing `at`.
    pub fn incr_at(&self, reference: &str, at: DateTime<Utc>) {
        let Reference { bucket, sub_key } = Reference::parse(reference);
        let hour = HourKey::from_datetime(at);
        with_child(&self.buckets, bucket, |group| group.incr(sub_key, hour));
    }

    /// Count recorded for one counter slot (zero if unknown).
    pub fn count(&self, bucket: &str, sub_key: &str, hour: HourKey) -> u64 {
        self.buckets
            .read()
            .get(bucket)
            .map(|group| group.count(sub_key, hour))
            .unwrap_or(0)
    }

    pub fn bucket_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.buckets.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.read().is_empty()
    }

    /// Report for one top-level bucket.
    ///
    /// An unknown bucket has simply not been counted yet: the result is the
    /// zero-valued report, not an error.
    pub fn report(&self, bucket: &str) -> Report {
        let now = HourKey::from_datetime(self.clock.now());
        self.buckets
            .read()
            .get(bucket)
            .map(|group| group.report(now))
            .unwrap_or_default()
    }

    /// Report over every bucket. Only `subs` is populated at this level.
    pub fn report_all(&self) -> Report {
        let now = HourKey::from_datetime(self.clock.now());
        let buckets = self
            .buckets
            .read()
            .iter()
            .map(|(name, group)| (name.clone(), group.report(now)))
            .collect();
        Report::root(buckets)
    }

    /// Serialize every bucket, sub-key and hour slot.
    pub fn dump(&self) -> Result<Vec<u8>, SnapshotError> {
        snapshot::encode(&self.to_snapshot())
    }

    /// Rebuild a root from [`Stats::dump`] output.
    pub fn load(bytes: &[u8], clock: Arc<dyn Clock>) -> Result<Self, SnapshotError> {
        let snapshot = snapshot::decode(bytes)?;
        Ok(Self::from_snapshot(snapshot, clock))
    }

    fn to_snapshot(&self) -> SnapshotV1 {
        let buckets = self
            .buckets
            .read()
            .iter()
            .map(|(name, group)| (name.clone(), group.counts()))
            .collect();
        SnapshotV1 { buckets }
    }

    fn from_snapshot(snapshot: SnapshotV1, clock: Arc<dyn Clock>) -> Self {
        let buckets = snapshot
            .buckets
            .into_iter()
            .map(|(name, subs)| {
                let subs = subs
                    .into_iter()
                    .map(|(sub_key, counts)| (sub_key, Hourly::from_counts(counts)))
                    .collect();
                (name, Bucket::from_subs(subs))
            })
            .collect();
        Self {
            buckets: RwLock::new(buckets),
            clock,
        }
    }

    /// Every count as `bucket → sub_key → hour → count`.
    pub fn counts(&self) -> BTreeMap<String, BTreeMap<String, BTreeMap<HourKey, u64>>> {
        self.to_snapshot().buckets
    }
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stats")
            .field("buckets", &self.bucket_names())
            .finish_non_exhaustive()
    }
}
