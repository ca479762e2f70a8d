use thiserror::Error;

#[derive(Debug, Error)]
pub enum LmdbError {
    #[error("LMDB error: {0}")]
    Heed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("environment is closed")]
    Closed,
}

impl From<heed::Error> for LmdbError {
    fn from(e: heed::Error) -> Self {
        LmdbError::Heed(e.to_string())
    }
}

impl From<LmdbError> for hstats_store::StoreError {
    fn from(e: LmdbError) -> Self {
        match e {
            LmdbError::Heed(msg) => hstats_store::StoreError::Backend(msg),
            LmdbError::Io(err) => hstats_store::StoreError::Io(err.to_string()),
            LmdbError::Closed => hstats_store::StoreError::Closed,
        }
    }
}
