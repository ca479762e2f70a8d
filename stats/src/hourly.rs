//! Hourly counter: event counts for one sub-key, one slot per hour.

use std::collections::BTreeMap;

use parking_lot::Mutex;

use hstats_types::HourKey;

use crate::report::{mean, Report, LAST_DAY_HOURS};

/// Counts for a single `bucket.sub_key`, keyed by hour.
///
/// Slots are created lazily by the first increment in an hour and only ever
/// grow until the whole structure is replaced.
#[derive(Debug, Default)]
pub struct Hourly {
    counts: Mutex<BTreeMap<HourKey, u64>>,
}

impl Hourly {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_counts(counts: BTreeMap<HourKey, u64>) -> Self {
        Self {
            counts: Mutex::new(counts),
        }
    }

    /// Add one event to `hour`.
    pub fn incr(&self, hour: HourKey) {
        *self.counts.lock().entry(hour).or_insert(0) += 1;
    }

    /// Count recorded for `hour` (zero if none).
    pub fn count(&self, hour: HourKey) -> u64 {
        self.counts.lock().get(&hour).copied().unwrap_or(0)
    }

    /// Copy of every slot, oldest first.
    pub fn counts(&self) -> BTreeMap<HourKey, u64> {
        self.counts.lock().clone()
    }

    /// Leaf report relative to the hour `now`.
    pub fn report(&self, now: HourKey) -> Report {
        let counts = self.counts.lock();

        let mut total = 0u64;
        // hour of day -> (sum of counts, number of slots)
        let mut by_hour: BTreeMap<u8, (u64, u64)> = BTreeMap::new();
        let mut last_day = vec![0u64; LAST_DAY_HOURS];

        for (key, &count) in counts.iter() {
            total += count;

            let slot = by_hour.entry(key.hour_of_day()).or_insert((0, 0));
            slot.0 += count;
            slot.1 += 1;

            let ago = key.hours_before(now);
            if (0..LAST_DAY_HOURS as i64).contains(&ago) {
                last_day[ago as usize] = count;
            }
        }

        Report {
            total,
            average: mean(total, counts.len()),
            hourly_average: by_hour
                .into_iter()
                .map(|(hour, (sum, slots))| (hour, sum as f64 / slots as f64))
                .collect(),
            last_day,
            subs: BTreeMap::new(),
            observed: counts.keys().copied().collect(),
        }
    }
}
