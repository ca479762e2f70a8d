//! Reference string parsing.
//!
//! Clients address a counter with a flat `bucket.sub_key` string. The first
//! `.` separates the top-level bucket from the sub-key; any further dots stay
//! in the sub-key. A reference without a separator lands in the reserved
//! [`NO_BUCKET`] bucket.

/// Bucket used for references that carry no `bucket.` prefix.
///
/// A user-chosen bucket is the text before the first `.`, so it can never be
/// `"."` itself.
pub const NO_BUCKET: &str = ".";

/// Separator between bucket and sub-key.
pub const SEPARATOR: char = '.';

/// A reference split into its two addressing levels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reference<'a> {
    pub bucket: &'a str,
    pub sub_key: &'a str,
}

impl<'a> Reference<'a> {
    pub fn parse(raw: &'a str) -> Self {
        match raw.split_once(SEPARATOR) {
            Some((bucket, sub_key)) => Self { bucket, sub_key },
            None => Self {
                bucket: NO_BUCKET,
                sub_key: raw,
            },
        }
    }

    /// Whether this reference fell back to the reserved bucket.
    pub fn is_unbucketed(&self) -> bool {
        self.bucket == NO_BUCKET
    }
}
