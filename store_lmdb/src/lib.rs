//! LMDB storage backend for hourly-stats.
//!
//! Implements [`hstats_store::SnapshotStore`] using the `heed` LMDB bindings.
//! The whole counter hierarchy lives in a single value of a single named
//! database inside one environment.

pub mod environment;
pub mod error;
pub mod snapshot;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use snapshot::LmdbSnapshotStore;
