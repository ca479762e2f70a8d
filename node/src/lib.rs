//! hourly-stats node: owns the counter hierarchy for the process.
//!
//! The node is the central coordinator that:
//! - Restores the counters from the last snapshot at startup
//! - Serves increments and reports from memory
//! - Flushes a snapshot periodically and once more at shutdown
//! - Coordinates the shutdown of its subsystems

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod shutdown;

pub use config::NodeConfig;
pub use db::{StatsDb, DEFAULT_FLUSH_INTERVAL};
pub use error::NodeError;
pub use logging::{init_logging, LogFormat};
pub use metrics::NodeMetrics;
pub use shutdown::{ShutdownBarrier, ShutdownController};
