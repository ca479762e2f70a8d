//! Persistence manager against nullable and LMDB stores.

use std::sync::Arc;
use std::time::Duration;

use hstats_node::{NodeConfig, NodeError, StatsDb};
use hstats_nullables::{NullClock, NullSnapshotStore};
use hstats_stats::Stats;
use hstats_types::{HourKey, NO_BUCKET};

fn clock() -> Arc<NullClock> {
    Arc::new(NullClock::at(2024, 3, 1, 12, 0))
}

fn snapshot_with(reference: &str, times: usize) -> Vec<u8> {
    let stats = Stats::with_clock(clock());
    for _ in 0..times {
        stats.incr(reference);
    }
    stats.dump().unwrap()
}

#[tokio::test]
async fn close_writes_exactly_one_snapshot() {
    let store = Arc::new(NullSnapshotStore::new());
    let db = StatsDb::open(store.clone(), clock()).unwrap();
    db.start(Duration::from_secs(3600));

    db.incr("signup.web");
    db.incr("signup.web");
    db.close().await.unwrap();

    assert_eq!(store.write_count(), 1);
    assert!(store.is_closed());

    let restored = Stats::load(&store.snapshot().unwrap(), clock()).unwrap();
    assert_eq!(restored.report("signup").total, 2);
}

#[tokio::test]
async fn close_without_start_still_flushes() {
    let store = Arc::new(NullSnapshotStore::new());
    let db = StatsDb::open(store.clone(), clock()).unwrap();
    db.incr("a.b");
    db.close().await.unwrap();
    assert_eq!(store.write_count(), 1);
}

#[tokio::test]
async fn second_close_is_a_no_op() {
    let store = Arc::new(NullSnapshotStore::new());
    let db = StatsDb::open(store.clone(), clock()).unwrap();
    db.close().await.unwrap();
    db.close().await.unwrap();
    assert_eq!(store.write_count(), 1);
    assert!(db.is_closed());
}

#[tokio::test]
async fn periodic_flush_runs_and_stops_after_close() {
    let store = Arc::new(NullSnapshotStore::new());
    let db = StatsDb::open(store.clone(), clock()).unwrap();
    db.incr("page.home");
    db.start(Duration::from_millis(20));

    tokio::time::sleep(Duration::from_millis(150)).await;
    let periodic = store.write_count();
    assert!(periodic >= 2, "expected periodic writes, got {periodic}");

    db.close().await.unwrap();
    let after_close = store.write_count();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(store.write_count(), after_close);
    assert!(matches!(db.flush(), Err(NodeError::Closed)));
}

#[tokio::test]
async fn close_after_periodic_flushes_adds_one_complete_write() {
    let store = Arc::new(NullSnapshotStore::new());
    let db = StatsDb::open(store.clone(), clock()).unwrap();
    db.start(Duration::from_millis(20));

    for _ in 0..3 {
        db.incr("page.home");
    }
    tokio::time::sleep(Duration::from_millis(100)).await;
    for _ in 0..3 {
        db.incr("page.about");
    }

    let before_close = store.write_count();
    assert!(before_close >= 2, "expected periodic writes, got {before_close}");
    db.close().await.unwrap();
    let after_close = store.write_count();
    assert_eq!(after_close, before_close + 1);

    let restored = Stats::load(&store.snapshot().unwrap(), clock()).unwrap();
    assert_eq!(restored.report("page").total, 6);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(store.write_count(), after_close);
}

#[tokio::test]
async fn first_periodic_flush_waits_one_interval() {
    let store = Arc::new(NullSnapshotStore::new());
    let db = StatsDb::open(store.clone(), clock()).unwrap();
    db.start(Duration::from_millis(500));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(store.write_count(), 0);
    db.close().await.unwrap();
}

#[tokio::test]
async fn periodic_failures_do_not_stop_the_flusher() {
    let store = Arc::new(NullSnapshotStore::new());
    let db = StatsDb::open(store.clone(), clock()).unwrap();
    store.set_fail_writes(true);
    db.start(Duration::from_millis(20));

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(db.metrics().flush_failures.get() >= 2);

    store.set_fail_writes(false);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(store.write_count() >= 1);

    db.close().await.unwrap();
}

#[tokio::test]
async fn failed_final_flush_is_returned() {
    let store = Arc::new(NullSnapshotStore::new());
    let db = StatsDb::open(store.clone(), clock()).unwrap();
    db.incr("a.b");
    store.set_fail_writes(true);

    let result = db.close().await;
    assert!(matches!(result, Err(NodeError::Store(_))));
    assert!(store.is_closed());
}

#[tokio::test]
async fn counters_keep_working_after_close() {
    let store = Arc::new(NullSnapshotStore::new());
    let db = StatsDb::open(store.clone(), clock()).unwrap();
    db.close().await.unwrap();

    db.incr("late.event");
    assert_eq!(db.report("late").total, 1);
    assert_eq!(store.write_count(), 1);
}

#[test]
fn restores_from_existing_snapshot() {
    let store = Arc::new(NullSnapshotStore::with_snapshot(snapshot_with("signup.web", 3)));
    let db = StatsDb::open(store, clock()).unwrap();
    let hour: HourKey = "24030112".parse().unwrap();
    assert_eq!(db.stats().count("signup", "web", hour), 3);
    assert_eq!(db.report("signup").last_day[0], 3);
}

#[test]
fn corrupt_snapshot_fails_open() {
    let store = Arc::new(NullSnapshotStore::with_snapshot(b"not a snapshot".to_vec()));
    assert!(matches!(
        StatsDb::open(store, clock()),
        Err(NodeError::Snapshot(_))
    ));
}

#[test]
fn unreadable_store_fails_open() {
    let store = Arc::new(NullSnapshotStore::new());
    store.set_fail_reads(true);
    assert!(matches!(
        StatsDb::open(store, clock()),
        Err(NodeError::Store(_))
    ));
}

#[tokio::test]
async fn lmdb_round_trip_across_restarts() {
    let dir = tempfile::tempdir().unwrap();
    let config = NodeConfig {
        db_path: dir.path().join("db"),
        auth_token: "t".into(),
        map_size_mb: 8,
        ..Default::default()
    };

    let db = StatsDb::open_lmdb(&config).unwrap();
    db.incr("signup.web");
    db.incr("signup.ios");
    db.incr("solo");
    db.close().await.unwrap();

    let reopened = StatsDb::open_lmdb(&config).unwrap();
    let mut names = reopened.stats().bucket_names();
    names.sort();
    assert_eq!(names, vec![NO_BUCKET.to_string(), "signup".to_string()]);
    assert_eq!(reopened.report("signup").total, 2);
    assert_eq!(reopened.report(NO_BUCKET).subs["solo"].total, 1);
    reopened.close().await.unwrap();
}
