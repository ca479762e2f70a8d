//! HTTP transport for hourly-stats.
//!
//! Provides endpoints for:
//! - Incrementing a counter: `POST /stats/{bucket}/{key}`
//! - Reporting a bucket: `GET /stats/{bucket}`
//! - Prometheus metrics: `GET /metrics`
//! - Liveness: `GET /health`
//!
//! Everything except `/health` requires the configured token in the
//! `Authorization` header.

pub mod error;
pub mod handlers;
pub mod server;
pub mod service;

pub use error::RpcError;
pub use server::{AppState, StatsServer};
pub use service::CounterService;
