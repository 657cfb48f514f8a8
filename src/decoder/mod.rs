//! DecoderClient - external image-decode service adapter
//!
//! ## Responsibilities
//!
//! - Send captured frames to the decode service
//! - Parse the extracted code list (zero or more, in extraction order)
//! - Health probing
//!
//! Turning pixels into code strings is not this crate's business; the
//! decode sidecar owns it.

use crate::error::{Error, Result};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::time::Duration;

/// Decode service response
#[derive(Debug, Clone, Deserialize)]
pub struct DecodeResponse {
    /// Extracted code payloads, in extraction order.
    #[serde(default)]
    pub codes: Vec<String>,
}

/// Decode service client
pub struct DecoderClient {
    client: reqwest::Client,
    base_url: String,
}

impl DecoderClient {
    /// Create new decoder client
    pub fn new(base_url: String) -> Self {
        Self::with_timeout(base_url, Duration::from_secs(5))
    }

    /// Create new decoder client with custom timeout
    pub fn with_timeout(base_url: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { client, base_url }
    }

    /// Check decode service health
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/healthz", self.base_url);
        match self.client.get(&url).send().await {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    /// Decode one frame into its code payloads.
    pub async fn decode(&self, frame: Vec<u8>) -> Result<Vec<String>> {
        let url = format!("{}/v1/decode", self.base_url);

        let form = Form::new().part(
            "frame",
            Part::bytes(frame)
                .file_name("frame.jpg")
                .mime_str("image/jpeg")?,
        );

        let resp = self.client.post(&url).multipart(form).send().await?;

        if !resp.status().is_success() {
            return Err(Error::Decode(format!(
                "decode service returned {}",
                resp.status()
            )));
        }

        let result: DecodeResponse = resp.json().await?;
        Ok(result.codes)
    }

    /// Get base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_response_defaults_to_empty() {
        let resp: DecodeResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.codes.is_empty());

        let resp: DecodeResponse = serde_json::from_str(r#"{"codes":["A1","B2"]}"#).unwrap();
        assert_eq!(resp.codes, vec!["A1", "B2"]);
    }

    #[tokio::test]
    async fn health_check_false_when_unreachable() {
        let client = DecoderClient::with_timeout(
            "http://127.0.0.1:9".to_string(),
            Duration::from_millis(500),
        );
        assert!(!client.health_check().await.unwrap());
    }
}
