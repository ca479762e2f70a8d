use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to encode snapshot: {0}")]
    Encode(String),

    #[error("failed to decode snapshot: {0}")]
    Decode(String),

    #[error("snapshot is truncated ({0} bytes)")]
    Truncated(usize),

    #[error("not a counter snapshot (bad magic)")]
    BadMagic,

    #[error("unsupported snapshot format version {0}")]
    UnsupportedVersion(u16),
}
