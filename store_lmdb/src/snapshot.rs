//! LMDB implementation of SnapshotStore.

use std::path::Path;

use parking_lot::RwLock;

use hstats_store::{SnapshotStore, StoreError};

use crate::{LmdbEnvironment, LmdbError};

/// Key of the single snapshot slot.
const SNAPSHOT_KEY: &str = "hstats";

/// Snapshot slot backed by one LMDB value.
///
/// The environment sits behind a lock so that [`SnapshotStore::close`] can
/// take it out while other handles might still be calling in; those calls
/// then see [`StoreError::Closed`].
pub struct LmdbSnapshotStore {
    environment: RwLock<Option<LmdbEnvironment>>,
}

impl LmdbSnapshotStore {
    pub fn new(environment: LmdbEnvironment) -> Self {
        Self {
            environment: RwLock::new(Some(environment)),
        }
    }

    /// Open (creating if needed) the environment at `path`.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        Ok(Self::new(LmdbEnvironment::open(path, map_size)?))
    }
}

impl SnapshotStore for LmdbSnapshotStore {
    fn load_latest_snapshot(&self) -> Result<Option<Vec<u8>>, StoreError> {
        let guard = self.environment.read();
        let lmdb = guard.as_ref().ok_or(LmdbError::Closed)?;
        let rtxn = lmdb.env.read_txn().map_err(LmdbError::from)?;
        let value = lmdb
            .stats_db
            .get(&rtxn, SNAPSHOT_KEY)
            .map_err(LmdbError::from)?
            .map(<[u8]>::to_vec);
        Ok(value)
    }

    fn store_snapshot(&self, bytes: &[u8]) -> Result<(), StoreError> {
        let guard = self.environment.read();
        let lmdb = guard.as_ref().ok_or(LmdbError::Closed)?;
        let mut wtxn = lmdb.env.write_txn().map_err(LmdbError::from)?;
        lmdb.stats_db
            .put(&mut wtxn, SNAPSHOT_KEY, bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn close(&self) -> Result<(), StoreError> {
        match self.environment.write().take() {
            Some(lmdb) => {
                lmdb.close();
                Ok(())
            }
            None => Err(StoreError::Closed),
        }
    }
}
