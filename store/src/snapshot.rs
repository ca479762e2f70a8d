//! Snapshot storage trait.

use crate::StoreError;

/// A single-slot store for opaque snapshot payloads.
///
/// Implementations must be safe to share between the periodic flusher and the
/// shutdown path; the persistence manager serializes writes itself.
pub trait SnapshotStore: Send + Sync {
    /// Read the last stored snapshot, or `None` if nothing was ever stored.
    fn load_latest_snapshot(&self) -> Result<Option<Vec<u8>>, StoreError>;

    /// Replace the stored snapshot with `bytes`.
    fn store_snapshot(&self, bytes: &[u8]) -> Result<(), StoreError>;

    /// Release the underlying resources. Later calls to the other methods
    /// return [`StoreError::Closed`].
    fn close(&self) -> Result<(), StoreError>;
}
