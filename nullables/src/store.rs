//! Nullable snapshot store: thread-safe in-memory slot for testing.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;

use hstats_store::{SnapshotStore, StoreError};

/// An in-memory snapshot slot that records every write.
///
/// Failures can be injected for reads and writes to exercise the error
/// paths of the persistence manager.
#[derive(Default)]
pub struct NullSnapshotStore {
    slot: Mutex<Option<Vec<u8>>>,
    writes: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    closed: AtomicBool,
}

impl NullSnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose slot already holds `bytes`.
    pub fn with_snapshot(bytes: Vec<u8>) -> Self {
        let store = Self::new();
        *store.slot.lock() = Some(bytes);
        store
    }

    /// Current slot contents.
    pub fn snapshot(&self) -> Option<Vec<u8>> {
        self.slot.lock().clone()
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl SnapshotStore for NullSnapshotStore {
    fn load_latest_snapshot(&self) -> Result<Option<Vec<u8>>, StoreError> {
        if self.is_closed() {
            return Err(StoreError::Closed);
        }
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Io("injected read failure".to_string()));
        }
        Ok(self.snapshot())
    }

    fn store_snapshot(&self, bytes: &[u8]) -> Result<(), StoreError> {
        if self.is_closed() {
            return Err(StoreError::Closed);
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Io("injected write failure".to_string()));
        }
        *self.slot.lock() = Some(bytes.to_vec());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn close(&self) -> Result<(), StoreError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Err(StoreError::Closed);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_writes() {
        let store = NullSnapshotStore::new();
        assert!(store.load_latest_snapshot().unwrap().is_none());
        store.store_snapshot(b"one").unwrap();
        store.store_snapshot(b"two").unwrap();
        assert_eq!(store.write_count(), 2);
        assert_eq!(store.snapshot().as_deref(), Some(&b"two"[..]));
    }

    #[test]
    fn injected_write_failure_is_not_counted() {
        let store = NullSnapshotStore::new();
        store.set_fail_writes(true);
        assert!(store.store_snapshot(b"x").is_err());
        assert_eq!(store.write_count(), 0);
        assert!(store.snapshot().is_none());
    }
}
