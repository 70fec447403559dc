//! Error types for the cache service
//!
//! Internal layers return `Result<T>`; the consumer-facing methods on
//! `TieredCache` swallow these and degrade to cache-miss behavior.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache service.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Remote store unreachable, not connected, or refused the command
    #[error("Connection error: {0}")]
    Connection(String),

    /// Remote store did not answer within the configured bound
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Value could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Missing or invalid startup parameters
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Command rejected by the remote store while the connection stayed healthy
    #[error("Backend error: {0}")]
    Backend(String),

    /// Key not found in any tier
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CacheError {
    /// True for failures that mean the primary tier should be treated as down.
    pub fn is_connection_failure(&self) -> bool {
        matches!(self, CacheError::Connection(_) | CacheError::Timeout(_))
    }
}

impl From<redis::RedisError> for CacheError {
    fn from(e: redis::RedisError) -> Self {
        if e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal() || e.is_timeout() {
            CacheError::Connection(e.to_string())
        } else {
            CacheError::Backend(e.to_string())
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) | CacheError::Serialization(_) => StatusCode::BAD_REQUEST,
            CacheError::Connection(_) | CacheError::Timeout(_) | CacheError::Backend(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            CacheError::Configuration(_) | CacheError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache service.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        let test_cases = vec![
            (CacheError::NotFound("key".to_string()), StatusCode::NOT_FOUND),
            (CacheError::InvalidRequest("bad".to_string()), StatusCode::BAD_REQUEST),
            (CacheError::Connection("down".to_string()), StatusCode::SERVICE_UNAVAILABLE),
            (CacheError::Timeout("GET".to_string()), StatusCode::SERVICE_UNAVAILABLE),
            (CacheError::Configuration("missing".to_string()), StatusCode::INTERNAL_SERVER_ERROR),
            (CacheError::Internal("error".to_string()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, expected_status) in test_cases {
            let response = error.into_response();
            assert_eq!(response.status(), expected_status);
        }
    }

    #[test]
    fn test_connection_failure_classification() {
        assert!(CacheError::Connection("x".into()).is_connection_failure());
        assert!(CacheError::Timeout("x".into()).is_connection_failure());
        assert!(!CacheError::NotFound("x".into()).is_connection_failure());
        assert!(!CacheError::Backend("WRONGTYPE".into()).is_connection_failure());
        assert!(!CacheError::Configuration("x".into()).is_connection_failure());
    }
}
