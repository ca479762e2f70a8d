//! Derived, read-only aggregate views over the counter hierarchy.
//!
//! A [`Report`] is recomputed on every query and never persisted. Leaf
//! reports come from an [`Hourly`](crate::Hourly) counter; bucket reports
//! merge their children; the root report only carries `subs`.
//!
//! An average over zero observations is NaN at every level. In JSON it is
//! written as `null`, and `null` reads back as NaN.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use hstats_types::HourKey;

/// Length of the rolling histogram; index `i` is "`i` hours ago".
pub const LAST_DAY_HOURS: usize = 24;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Report {
    /// Sum of all counts in scope.
    pub total: u64,

    /// `total` divided by the number of distinct hour slots in scope.
    #[serde(with = "nan_as_null", default)]
    pub average: f64,

    /// Hour of day (0..=23) → mean count per slot at that hour. Leaf only.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub hourly_average: BTreeMap<u8, f64>,

    /// Counts for the last 24 hours, newest first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub last_day: Vec<u64>,

    /// Child reports by key.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub subs: BTreeMap<String, Report>,

    /// Distinct hour slots seen in scope, used to merge averages upward.
    #[serde(skip)]
    pub(crate) observed: BTreeSet<HourKey>,
}

impl Report {
    /// Merge child reports into a bucket-level report.
    ///
    /// The average denominator is the union of the children's hour slots, so
    /// an hour seen by several children counts once.
    pub(crate) fn merge(children: BTreeMap<String, Report>) -> Report {
        let mut total = 0u64;
        let mut observed = BTreeSet::new();
        let mut last_day = vec![0u64; LAST_DAY_HOURS];

        for child in children.values() {
            total += child.total;
            observed.extend(child.observed.iter().copied());
            for (slot, count) in last_day.iter_mut().zip(&child.last_day) {
                *slot += count;
            }
        }

        Report {
            total,
            average: mean(total, observed.len()),
            hourly_average: BTreeMap::new(),
            last_day,
            subs: children,
            observed,
        }
    }

    /// Root-level report: only the per-bucket tree.
    pub(crate) fn root(buckets: BTreeMap<String, Report>) -> Report {
        Report {
            subs: buckets,
            ..Report::default()
        }
    }

    /// Whether nothing has been counted in scope.
    pub fn is_empty(&self) -> bool {
        self.total == 0 && self.subs.is_empty()
    }
}

/// `total / observations`, NaN when there are none.
pub(crate) fn mean(total: u64, observations: usize) -> f64 {
    if observations == 0 {
        return f64::NAN;
    }
    total as f64 / observations as f64
}

mod nan_as_null {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_nan() {
            serializer.serialize_none()
        } else {
            serializer.serialize_f64(*value)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
    }
}
