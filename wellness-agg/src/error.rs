//! Error types for wellness-agg
//!
//! Two layers:
//! - [`AggregationError`]: engine contract violations, surfaced synchronously
//! - [`ApiError`]: HTTP mapping with a JSON error body
//!
//! Per-source fetch failures are not errors at this level; see
//! [`crate::types::FetchError`].

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Engine error
#[derive(Debug, Error)]
pub enum AggregationError {
    /// Empty countries or metrics list; rejected before any fetch
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Source absent from the validity configuration table
    #[error("Unknown source: {0}")]
    UnknownSource(String),
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Engine error
    #[error(transparent)]
    Aggregation(#[from] AggregationError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Aggregation(AggregationError::InvalidRequest(msg)) => {
                (StatusCode::BAD_REQUEST, "INVALID_REQUEST", msg)
            }
            ApiError::Aggregation(AggregationError::UnknownSource(source)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "UNKNOWN_SOURCE",
                format!("Unknown source: {}", source),
            ),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
