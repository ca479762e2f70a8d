//! Clock abstraction.
//!
//! Every increment is stamped with the hour reported by a [`Clock`]. The
//! production clock reads the system time in UTC; tests swap in a
//! controllable one.

use chrono::{DateTime, Utc};

/// Source of wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The system wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
