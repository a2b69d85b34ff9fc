//! Error taxonomy shared by the stores, the session guard and the handlers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::dispatch::simulate::not_found_response;

/// Errors that can occur while serving a request.
#[derive(Debug, Error)]
pub enum SimError {
    /// A durable store could not be read or written.
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A durable document could not be encoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// CSV export could not be rendered.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Missing or malformed admin input.
    #[error("{0}")]
    Validation(String),

    /// Unknown hostname or empty report.
    #[error("{0}")]
    NotFound(String),

    /// Missing, expired or invalid session.
    #[error("Unauthorized")]
    Unauthorized,

    /// Status path outside the known catalogue.
    #[error("unsupported status code {0}")]
    UnsupportedCode(u16),

    /// Outbound report delivery failed.
    #[error("mail delivery failed: {0}")]
    Mail(String),
}

/// Result type for request-scoped operations.
pub type SimResult<T> = Result<T, SimError>;

impl SimError {
    /// HTTP status this error is surfaced as.
    pub fn status(&self) -> StatusCode {
        match self {
            SimError::Io(_) | SimError::Serialization(_) | SimError::Csv(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            SimError::Validation(_) => StatusCode::BAD_REQUEST,
            SimError::NotFound(_) | SimError::UnsupportedCode(_) => StatusCode::NOT_FOUND,
            SimError::Unauthorized => StatusCode::UNAUTHORIZED,
            SimError::Mail(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for SimError {
    fn into_response(self) -> Response {
        match &self {
            SimError::UnsupportedCode(_) => not_found_response(),
            SimError::Io(e) => {
                tracing::error!(error = %e, "Store I/O failure");
                (self.status(), "Internal Server Error").into_response()
            }
            SimError::Serialization(_) | SimError::Csv(_) => {
                tracing::error!(error = %self, "Encoding failure");
                (self.status(), "Internal Server Error").into_response()
            }
            _ => (self.status(), self.to_string()).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(SimError::Validation("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(SimError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(SimError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(SimError::UnsupportedCode(299).status(), StatusCode::NOT_FOUND);
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk");
        assert_eq!(SimError::from(io).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_error_display() {
        let err = SimError::Validation("Missing required fields".into());
        assert_eq!(err.to_string(), "Missing required fields");
        assert_eq!(SimError::Unauthorized.to_string(), "Unauthorized");
    }
}
