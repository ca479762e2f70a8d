//! Load(Dump(root)) reproduces every count and keeps counting identically.

use std::sync::Arc;

use proptest::prelude::*;

use hstats_nullables::NullClock;
use hstats_stats::{SnapshotError, Stats};
use hstats_types::{Clock, HourKey};

fn clock() -> Arc<NullClock> {
    Arc::new(NullClock::at(2024, 1, 1, 10, 0))
}

#[test]
fn restored_root_continues_like_the_original() {
    let clock = clock();
    let original = Stats::with_clock(clock.clone());
    original.incr("signup.web");
    original.incr("signup.ios");
    original.incr("solo");
    clock.advance_hours(1);
    original.incr("signup.web");

    let restored = Stats::load(&original.dump().unwrap(), clock.clone()).unwrap();
    assert_eq!(restored.counts(), original.counts());

    original.incr("signup.web");
    restored.incr("signup.web");
    assert_eq!(restored.counts(), original.counts());

    let hour = HourKey::from_datetime(clock.now());
    assert_eq!(restored.count("signup", "web", hour), 2);
    assert_eq!(restored.report("signup").total, original.report("signup").total);
}

#[test]
fn empty_root_round_trips() {
    let stats = Stats::with_clock(clock());
    let restored = Stats::load(&stats.dump().unwrap(), clock()).unwrap();
    assert!(restored.is_empty());
}

#[test]
fn garbage_is_rejected() {
    let err = Stats::load(b"definitely not a snapshot", clock()).unwrap_err();
    assert!(matches!(err, SnapshotError::BadMagic));
}

proptest! {
    #[test]
    fn arbitrary_increments_survive_round_trip(
        events in prop::collection::vec(("[a-c]{1,2}", "[x-z]{1,2}", 0i64..72), 0..64)
    ) {
        let clock = clock();
        let original = Stats::with_clock(clock.clone());
        let base = clock.now();
        for (bucket, sub, hours) in &events {
            original.incr_at(&format!("{bucket}.{sub}"), base - chrono::Duration::hours(*hours));
        }

        let restored = Stats::load(&original.dump().unwrap(), clock.clone()).unwrap();
        prop_assert_eq!(restored.counts(), original.counts());

        let total: u64 = restored.bucket_names().iter().map(|b| restored.report(b).total).sum();
        prop_assert_eq!(total, events.len() as u64);
    }
}
