//! Abstract snapshot storage for hourly-stats.
//!
//! The persistence manager only ever talks to a [`SnapshotStore`]: one fixed
//! logical slot that holds the most recent snapshot, overwritten in place on
//! every flush. Backends (LMDB, in-memory for testing) implement the trait;
//! the rest of the workspace depends only on it.

pub mod error;
pub mod snapshot;

pub use error::StoreError;
pub use snapshot::SnapshotStore;
