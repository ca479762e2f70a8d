//! Hour-bucket keys.
//!
//! An [`HourKey`] names one calendar hour in UTC. It is the finest time
//! resolution tracked by the counters. The canonical text form is `YYMMDDHH`
//! (e.g. `"24010100"` for 2024-01-01 00:00 UTC), which is also the form that
//! ends up in persisted snapshots.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::TypesError;

/// chrono format string for the canonical form.
pub const HOUR_KEY_FORMAT: &str = "%y%m%d%H";

/// First year the two-digit text form can name (`69` pivots to 1969).
pub const MIN_YEAR: i32 = 1969;
/// Last year the two-digit text form can name (`68` is 2068).
pub const MAX_YEAR: i32 = 2068;

/// One calendar hour in UTC. Minutes and seconds are always zero.
///
/// Only hours in [`MIN_YEAR`]..=[`MAX_YEAR`] have a distinct `YYMMDDHH` form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HourKey(NaiveDateTime);

impl HourKey {
    /// The hour containing `at`, clamped to the first or last hour of the
    /// representable range so every key survives a text round-trip.
    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        let naive = at.naive_utc();
        if naive.year() < MIN_YEAR {
            return Self::first();
        }
        if naive.year() > MAX_YEAR {
            return Self::last();
        }
        let start = naive
            .date()
            .and_hms_opt(naive.hour(), 0, 0)
            .expect("hour of a valid time is in range");
        Self(start)
    }

    /// Earliest representable hour: 1969-01-01 00:00 UTC.
    pub fn first() -> Self {
        Self(
            NaiveDate::from_ymd_opt(MIN_YEAR, 1, 1)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .expect("constant date is valid"),
        )
    }

    /// Latest representable hour: 2068-12-31 23:00 UTC.
    pub fn last() -> Self {
        Self(
            NaiveDate::from_ymd_opt(MAX_YEAR, 12, 31)
                .and_then(|d| d.and_hms_opt(23, 0, 0))
                .expect("constant date is valid"),
        )
    }

    /// Start of the hour as a UTC timestamp.
    pub fn start(&self) -> DateTime<Utc> {
        self.0.and_utc()
    }

    /// Hour of the day, 0..=23.
    pub fn hour_of_day(&self) -> u8 {
        self.0.hour() as u8
    }

    /// Whole hours between this key and `now`. Positive when `self` lies
    /// in the past relative to `now`, zero for the same hour.
    pub fn hours_before(&self, now: HourKey) -> i64 {
        (now.0 - self.0).num_hours()
    }
}

impl fmt::Display for HourKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(HOUR_KEY_FORMAT))
    }
}

impl FromStr for HourKey {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TypesError::InvalidHourKey(s.to_string());
        if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let field = |range: std::ops::Range<usize>| -> u32 {
            s[range].parse().unwrap_or(u32::MAX)
        };
        let yy = field(0..2);
        // Two-digit years pivot at 69, the same window chrono and strftime use.
        let year = if yy >= 69 { 1900 + yy } else { 2000 + yy };
        let start = NaiveDate::from_ymd_opt(year as i32, field(2..4), field(4..6))
            .and_then(|date| date.and_hms_opt(field(6..8), 0, 0))
            .ok_or_else(invalid)?;
        Ok(Self(start))
    }
}

impl Serialize for HourKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for HourKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 17).unwrap()
    }

    #[test]
    fn formats_as_yymmddhh() {
        let key = HourKey::from_datetime(at(2024, 1, 1, 0, 42));
        assert_eq!(key.to_string(), "24010100");
        let key = HourKey::from_datetime(at(2025, 12, 31, 23, 59));
        assert_eq!(key.to_string(), "25123123");
    }

    #[test]
    fn truncates_to_the_hour() {
        let a = HourKey::from_datetime(at(2024, 3, 5, 10, 1));
        let b = HourKey::from_datetime(at(2024, 3, 5, 10, 59));
        assert_eq!(a, b);
        assert_eq!(a.start(), Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap());
    }

    #[test]
    fn parses_canonical_form() {
        let key: HourKey = "24010100".parse().unwrap();
        assert_eq!(key, HourKey::from_datetime(at(2024, 1, 1, 0, 0)));
        assert_eq!(key.hour_of_day(), 0);
        let key: HourKey = "99123115".parse().unwrap();
        assert_eq!(key.start(), Utc.with_ymd_and_hms(1999, 12, 31, 15, 0, 0).unwrap());
    }

    #[test]
    fn rejects_malformed_keys() {
        for bad in ["", "2401010", "240101000", "24x10100", "24130100", "24013200", "24010124", "+2401010"] {
            assert!(bad.parse::<HourKey>().is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn hours_before_counts_whole_hours() {
        let now = HourKey::from_datetime(at(2024, 1, 2, 10, 30));
        let two_ago = HourKey::from_datetime(at(2024, 1, 2, 8, 5));
        let yesterday = HourKey::from_datetime(at(2024, 1, 1, 11, 0));
        assert_eq!(two_ago.hours_before(now), 2);
        assert_eq!(yesterday.hours_before(now), 23);
        assert_eq!(now.hours_before(two_ago), -2);
        assert_eq!(now.hours_before(now), 0);
    }

    #[test]
    fn years_outside_two_digit_window_are_clamped() {
        let late = HourKey::from_datetime(at(2070, 6, 1, 5, 0));
        assert_eq!(late, HourKey::last());
        assert_eq!(late.to_string(), "68123123");
        assert_eq!(late.to_string().parse::<HourKey>().unwrap(), late);

        let early = HourKey::from_datetime(at(1960, 6, 1, 5, 0));
        assert_eq!(early, HourKey::first());
        assert_eq!(early.to_string().parse::<HourKey>().unwrap(), early);

        for edge in [at(1969, 1, 1, 0, 0), at(2068, 12, 31, 23, 0)] {
            let key = HourKey::from_datetime(edge);
            assert_eq!(key.start().year(), edge.year());
            assert_eq!(key.to_string().parse::<HourKey>().unwrap(), key);
        }
    }

    #[test]
    fn orders_by_time() {
        let a: HourKey = "23123123".parse().unwrap();
        let b: HourKey = "24010100".parse().unwrap();
        assert!(a < b);
    }

    #[test]
    fn serializes_as_string() {
        let key: HourKey = "24010100".parse().unwrap();
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"24010100\"");
        let bytes = bincode::serialize(&key).unwrap();
        let decoded: HourKey = bincode::deserialize(&bytes).unwrap();
        assert_eq!(decoded, key);
        assert!(serde_json::from_str::<HourKey>("\"2401\"").is_err());
    }
}
