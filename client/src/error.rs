use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("no API token was set")]
    NoToken,

    #[error("invalid base URL: {0}")]
    InvalidUrl(String),

    #[error("server returned bad request error")]
    BadRequest,

    #[error("server returned unauthorized error (token might be invalid)")]
    Unauthorized,

    #[error("server returned forbidden error")]
    Forbidden,

    #[error("server returned not found error")]
    NotFound,

    #[error("server returned conflict error")]
    Conflict,

    #[error("server returned too many requests error")]
    TooManyRequests,

    #[error("server returned internal error")]
    Internal,

    #[error("server is unavailable")]
    Unavailable,

    #[error("server returned unexpected status {0}")]
    Status(u16),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    /// Whether another attempt may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ClientError::Internal | ClientError::Unavailable | ClientError::Transport(_)
        )
    }

    pub(crate) fn from_status(status: u16) -> Self {
        match status {
            400 => ClientError::BadRequest,
            401 => ClientError::Unauthorized,
            403 => ClientError::Forbidden,
            404 => ClientError::NotFound,
            409 => ClientError::Conflict,
            429 => ClientError::TooManyRequests,
            500 => ClientError::Internal,
            503 => ClientError::Unavailable,
            other => ClientError::Status(other),
        }
    }
}
