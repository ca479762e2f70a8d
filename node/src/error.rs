use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("snapshot error: {0}")]
    Snapshot(#[from] hstats_stats::SnapshotError),

    #[error("store error: {0}")]
    Store(#[from] hstats_store::StoreError),

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("persistence manager is closed")]
    Closed,

    #[error("background task failed: {0}")]
    Task(String),
}

impl From<hstats_store_lmdb::LmdbError> for NodeError {
    fn from(e: hstats_store_lmdb::LmdbError) -> Self {
        NodeError::Store(e.into())
    }
}
