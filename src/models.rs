//! Shared models and types for QRGate
//!
//! This module contains types shared across multiple modules
//! to avoid circular dependencies.

use serde::{Deserialize, Serialize};

/// Standard API response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub store_connected: bool,
    pub decoder_connected: bool,
    /// Codes currently in the local snapshot (not the store)
    pub cached_codes: usize,
}

/// Body for registering an allow-listed code
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterCodeRequest {
    pub code: String,
}

/// Full allow-list listing from the store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeListResponse {
    pub codes: Vec<String>,
    pub total: usize,
}

/// Allow-list size from the store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeCountResponse {
    pub total: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_response_success_shape() {
        let resp = ApiResponse::success(42);
        assert!(resp.ok);
        assert_eq!(resp.data, Some(42));
        assert!(resp.error.is_none());
    }

    #[test]
    fn api_response_error_omits_data() {
        let resp: ApiResponse<()> = ApiResponse::error("nope");
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["ok"], false);
        assert!(json.get("data").is_none());
        assert_eq!(json["error"], "nope");
    }
}
