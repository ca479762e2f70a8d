//! Named counter group: every sub-key of one top-level bucket.

use std::collections::{BTreeMap, HashMap};

use parking_lot::RwLock;

use hstats_types::HourKey;

use crate::hourly::Hourly;
use crate::nested::with_child;
use crate::report::Report;

/// sub-key → hourly counter, for one top-level bucket.
#[derive(Debug, Default)]
pub struct Bucket {
    subs: RwLock<HashMap<String, Hourly>>,
}

impl Bucket {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_subs(subs: HashMap<String, Hourly>) -> Self {
        Self {
            subs: RwLock::new(subs),
        }
    }

    /// Add one event for `sub_key` in `hour`, creating the counter if needed.
    pub fn incr(&self, sub_key: &str, hour: HourKey) {
        with_child(&self.subs, sub_key, |hourly| hourly.incr(hour));
    }

    /// Count for `sub_key` in `hour` (zero if either is unknown).
    pub fn count(&self, sub_key: &str, hour: HourKey) -> u64 {
        self.subs
            .read()
            .get(sub_key)
            .map(|hourly| hourly.count(hour))
            .unwrap_or(0)
    }

    pub fn sub_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.subs.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Copy of every counter, keyed by sub-key.
    pub fn counts(&self) -> BTreeMap<String, BTreeMap<HourKey, u64>> {
        self.subs
            .read()
            .iter()
            .map(|(sub_key, hourly)| (sub_key.clone(), hourly.counts()))
            .collect()
    }

    /// Bucket report relative to the hour `now`.
    pub fn report(&self, now: HourKey) -> Report {
        let children = self
            .subs
            .read()
            .iter()
            .map(|(sub_key, hourly)| (sub_key.clone(), hourly.report(now)))
            .collect();
        Report::merge(children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> HourKey {
        s.parse().unwrap()
    }

    #[test]
    fn sub_keys_are_independent() {
        let bucket = Bucket::new();
        let hour = key("24010100");
        bucket.incr("web", hour);
        bucket.incr("web", hour);
        bucket.incr("ios", hour);
        assert_eq!(bucket.count("web", hour), 2);
        assert_eq!(bucket.count("ios", hour), 1);
        assert_eq!(bucket.count("android", hour), 0);
        assert_eq!(bucket.sub_keys(), vec!["ios", "web"]);
    }

    #[test]
    fn report_average_uses_union_of_hours() {
        let bucket = Bucket::new();
        let hour = key("24010100");
        for _ in 0..3 {
            bucket.incr("a", hour);
        }
        for _ in 0..5 {
            bucket.incr("b", hour);
        }
        let r = bucket.report(key("24010105"));
        assert_eq!(r.total, 8);
        assert_eq!(r.average, 8.0);
        assert_eq!(r.subs["a"].average, 3.0);
        assert_eq!(r.subs["b"].average, 5.0);
        assert_eq!(r.last_day[5], 8);
    }

    #[test]
    fn report_keeps_leaf_hourly_average_only_on_subs() {
        let bucket = Bucket::new();
        bucket.incr("a", key("24010109"));
        let r = bucket.report(key("24010110"));
        assert!(r.hourly_average.is_empty());
        assert_eq!(r.subs["a"].hourly_average[&9], 1.0);
    }
}
