//! Error types for the checkout listing service
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Checkout Error Enum ==
/// Unified error type for the listing service and record stores.
///
/// Every variant is recoverable and reported to the caller; none of them
/// take the service down.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    /// Malformed tenant, identifier, limit, filter or field value
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Identifier already used within the tenant
    #[error("Checkout already exists: {0}")]
    AlreadyExists(String),

    /// No checkout with that identifier in the tenant
    #[error("Checkout not found: {0}")]
    NotFound(String),

    /// Pagination token could not be decoded
    #[error("Malformed cursor: {0}")]
    MalformedCursor(String),

    /// Backend failure of a pluggable record store
    #[error("Storage error: {0}")]
    Storage(String),
}

// == Cache Error Enum ==
/// Failures raised by a list cache backend.
///
/// The listing service never surfaces these; it degrades to a miss.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Cache backend could not be reached
    #[error("Cache unavailable: {0}")]
    Unavailable(String),

    /// Cached data could not be interpreted
    #[error("Cache corrupted: {0}")]
    Corrupted(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CheckoutError {
    fn into_response(self) -> Response {
        let status = match &self {
            CheckoutError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            CheckoutError::AlreadyExists(_) => StatusCode::CONFLICT,
            CheckoutError::NotFound(_) => StatusCode::NOT_FOUND,
            CheckoutError::MalformedCursor(_) => StatusCode::BAD_REQUEST,
            CheckoutError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the listing service.
pub type Result<T> = std::result::Result<T, CheckoutError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (CheckoutError::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (CheckoutError::AlreadyExists("x".into()), StatusCode::CONFLICT),
            (CheckoutError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (CheckoutError::MalformedCursor("x".into()), StatusCode::BAD_REQUEST),
            (CheckoutError::Storage("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_error_display() {
        let err = CheckoutError::NotFound("co1".to_string());
        assert_eq!(err.to_string(), "Checkout not found: co1");
    }
}
