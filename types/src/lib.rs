//! Fundamental types for hourly-stats.
//!
//! This crate defines the small vocabulary shared by every other crate in the
//! workspace: hour-bucket keys, reference string parsing, and the clock
//! abstraction used to decide which hour an event lands in.

pub mod error;
pub mod hour;
pub mod reference;
pub mod time;

pub use error::TypesError;
pub use hour::HourKey;
pub use reference::{Reference, NO_BUCKET};
pub use time::{Clock, SystemClock};
