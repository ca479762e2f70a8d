//! RPC request handlers.

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use hstats_stats::Report;

use crate::server::AppState;
use crate::RpcError;

/// Whether a path segment may name a bucket or key: `[a-z0-9_-]+`.
pub fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'_')
}

// ── Counters ─────────────────────────────────────────────────────────────

/// `POST /stats/{bucket}/{key}`
pub async fn post_stat(
    State(state): State<AppState>,
    Path((bucket, key)): Path<(String, String)>,
) -> Result<StatusCode, RpcError> {
    if !is_valid_segment(&bucket) || !is_valid_segment(&key) {
        return Err(RpcError::NotFound);
    }
    state.service.incr(&format!("{bucket}.{key}"));
    Ok(StatusCode::OK)
}

/// `GET /stats/{bucket}`
pub async fn get_report(
    State(state): State<AppState>,
    Path(bucket): Path<String>,
) -> Result<Json<Report>, RpcError> {
    if !is_valid_segment(&bucket) {
        return Err(RpcError::NotFound);
    }
    Ok(Json(state.service.report(&bucket)))
}

// ── Operations ───────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// `GET /health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// `GET /metrics`
pub async fn metrics(State(state): State<AppState>) -> Result<impl IntoResponse, RpcError> {
    let body = state.service.render_metrics().ok_or(RpcError::NotFound)?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_validation_matches_route_pattern() {
        for ok in ["signup", "a-b", "a_b", "0", "v2-beta_1"] {
            assert!(is_valid_segment(ok), "{ok} should be accepted");
        }
        for bad in ["", "Signup", "a.b", "a b", "é", "a/b"] {
            assert!(!is_valid_segment(bad), "{bad} should be rejected");
        }
    }
}
