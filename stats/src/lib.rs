//! Hourly counter engine.
//!
//! Counters form a three-level hierarchy, each level behind its own lock:
//!
//! - [`Stats`] (aggregation root): top-level bucket name → [`Bucket`]
//! - [`Bucket`] (named counter group): sub-key → [`Hourly`]
//! - [`Hourly`] (hourly counter): [`HourKey`](hstats_types::HourKey) → count
//!
//! Increments descend the hierarchy creating missing levels on demand;
//! reports ascend it, merging child [`Report`]s into their parents. The
//! [`snapshot`] module turns the whole root into an opaque byte payload and
//! back.

pub mod bucket;
pub mod error;
pub mod hourly;
mod nested;
pub mod report;
pub mod root;
pub mod snapshot;

pub use bucket::Bucket;
pub use error::SnapshotError;
pub use hourly::Hourly;
pub use report::{Report, LAST_DAY_HOURS};
pub use root::Stats;
