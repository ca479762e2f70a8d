//! Top-level error type shared across crates.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypesError {
    #[error("invalid hour key '{0}': expected YYMMDDHH")]
    InvalidHourKey(String),
}
