//! Nullable clock: deterministic time for testing.

use chrono::{DateTime, Duration, TimeZone, Utc};
use parking_lot::Mutex;

use hstats_types::Clock;

/// A deterministic clock for testing.
///
/// Time only advances when you tell it to.
pub struct NullClock {
    current: Mutex<DateTime<Utc>>,
}

impl NullClock {
    pub fn new(initial: DateTime<Utc>) -> Self {
        Self {
            current: Mutex::new(initial),
        }
    }

    /// Clock fixed at the given UTC date and time.
    ///
    /// # Panics
    ///
    /// Panics if the components do not form a valid date-time.
    pub fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> Self {
        let initial = Utc
            .with_ymd_and_hms(year, month, day, hour, minute, 0)
            .single()
            .expect("valid UTC date-time");
        Self::new(initial)
    }

    /// Advance time by a number of hours.
    pub fn advance_hours(&self, hours: i64) {
        *self.current.lock() += Duration::hours(hours);
    }

    /// Set the time to a specific value.
    pub fn set(&self, at: DateTime<Utc>) {
        *self.current.lock() = at;
    }
}

impl Clock for NullClock {
    fn now(&self) -> DateTime<Utc> {
        *self.current.lock()
    }
}
