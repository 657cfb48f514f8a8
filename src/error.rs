//! Error handling for QRGate

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Conflict (duplicate)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Remote store unreachable or misbehaving
    #[error("Store error: {0}")]
    Store(String),

    /// Frame capture error
    #[error("Capture error: {0}")]
    Capture(String),

    /// Decode service error
    #[error("Decode error: {0}")]
    Decode(String),

    /// Output line error
    #[error("Gpio error: {0}")]
    Gpio(String),

    /// Redis protocol/connection error
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            Error::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            Error::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            Error::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            Error::Store(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "STORE_ERROR",
                msg.clone(),
            ),
            Error::Redis(e) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "STORE_ERROR",
                e.to_string(),
            ),
            Error::Capture(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CAPTURE_ERROR",
                msg.clone(),
            ),
            Error::Decode(msg) => (StatusCode::BAD_GATEWAY, "DECODE_ERROR", msg.clone()),
            Error::Gpio(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "GPIO_ERROR",
                msg.clone(),
            ),
            Error::Http(e) => (StatusCode::BAD_GATEWAY, "HTTP_ERROR", e.to_string()),
            Error::Serialization(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "SERIALIZATION_ERROR",
                e.to_string(),
            ),
            Error::Io(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "IO_ERROR",
                e.to_string(),
            ),
            Error::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg.clone(),
            ),
        };

        tracing::error!(
            status = %status,
            error_code = %error_code,
            message = %message,
            "Request error"
        );

        let body = Json(json!({
            "error_code": error_code,
            "message": message
        }));

        (status, body).into_response()
    }
}
