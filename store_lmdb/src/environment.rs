//! LMDB environment setup.

use std::path::{Path, PathBuf};

use heed::types::{Bytes, Str};
use heed::{Database, Env, EnvOpenOptions};

use crate::LmdbError;

/// Name of the database holding the snapshot slot.
pub const STATS_DB_NAME: &str = "hourly-stats";

/// Wraps the LMDB environment and the snapshot database handle.
pub struct LmdbEnvironment {
    pub(crate) env: Env,
    pub(crate) stats_db: Database<Str, Bytes>,
    path: PathBuf,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given directory.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;
        // SAFETY: the environment directory is owned by this process for its
        // whole lifetime and is opened exactly once.
        let env = unsafe { EnvOpenOptions::new().map_size(map_size).max_dbs(1).open(path)? };

        let mut wtxn = env.write_txn()?;
        let stats_db: Database<Str, Bytes> = env.create_database(&mut wtxn, Some(STATS_DB_NAME))?;
        wtxn.commit()?;

        tracing::debug!(path = %path.display(), map_size, "LMDB environment opened");
        Ok(Self {
            env,
            stats_db,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Close the environment and block until LMDB has released it.
    pub fn close(self) {
        let path = self.path;
        self.env.prepare_for_closing().wait();
        tracing::debug!(path = %path.display(), "LMDB environment closed");
    }
}
