//! HTTP client for hourly-stats.
//!
//! Wraps the two transport endpoints. Transport failures and `500`/`503`
//! responses are retried with exponential backoff; every other non-success
//! status maps to a dedicated [`ClientError`] variant right away.

pub mod client;
pub mod error;

pub use client::StatsClient;
pub use error::ClientError;
