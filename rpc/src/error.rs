//! RPC error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("not found")]
    NotFound,

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Server(String),
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let status = match self {
            RpcError::Unauthorized => StatusCode::UNAUTHORIZED,
            RpcError::NotFound => StatusCode::NOT_FOUND,
            RpcError::Bind { .. } | RpcError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let reason = status.canonical_reason().unwrap_or("error");
        (status, reason).into_response()
    }
}
