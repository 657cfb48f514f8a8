//! NotificationDispatcher - best-effort access event reporting
//!
//! ## Responsibilities
//!
//! - One outbound request per admitted access event
//! - Bounded timeout, outcome classification, no retries
//! - Detached dispatch: a slow endpoint never stalls scanning or actuation
//!
//! The physical actuation has always already happened by the time a
//! notification goes out; nothing here may affect it.

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Direction of travel stamped on an access event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Entry,
    Exit,
}

impl Direction {
    /// Convert to string for logging/serialization
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Entry => "entry",
            Direction::Exit => "exit",
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "entry" => Ok(Direction::Entry),
            "exit" => Ok(Direction::Exit),
            other => Err(format!("unknown direction: {other}")),
        }
    }
}

/// An admitted access, created at the moment of admission.
#[derive(Debug, Clone, Serialize)]
pub struct AccessEvent {
    pub code: String,
    pub direction: Direction,
    pub observed_at: DateTime<Utc>,
}

impl AccessEvent {
    /// Stamp a new event for `code` at the current instant.
    pub fn now(code: impl Into<String>, direction: Direction) -> Self {
        Self {
            code: code.into(),
            direction,
            observed_at: Utc::now(),
        }
    }
}

/// Wire payload for the notification endpoint.
#[derive(Debug, Serialize)]
struct NotifyPayload<'a> {
    code: &'a str,
    direction: Direction,
}

/// NotificationDispatcher instance
#[derive(Clone)]
pub struct NotificationDispatcher {
    http: reqwest::Client,
    url: String,
}

impl NotificationDispatcher {
    /// Create a dispatcher posting to `url` with the given request timeout.
    pub fn new(url: String, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .expect("Failed to build HTTP client");

        Self { http, url }
    }

    /// Send one notification, returning whether the endpoint acknowledged it.
    ///
    /// All outcomes are logged and none propagate: the caller's admission
    /// decision is already final.
    pub async fn send(&self, event: &AccessEvent) -> bool {
        let payload = NotifyPayload {
            code: &event.code,
            direction: event.direction,
        };

        match self.http.post(&self.url).json(&payload).send().await {
            Ok(resp) if resp.status().is_success() => {
                debug!(code = %event.code, "Access event acknowledged");
                true
            }
            Ok(resp) if resp.status() == StatusCode::NOT_FOUND => {
                warn!(url = %self.url, "Notification endpoint missing");
                false
            }
            Ok(resp) => {
                error!(
                    code = %event.code,
                    status = %resp.status(),
                    "Notification rejected"
                );
                false
            }
            Err(e) if e.is_timeout() => {
                error!(code = %event.code, "Notification timed out");
                false
            }
            Err(e) if e.is_connect() => {
                error!(code = %event.code, error = %e, "Notification connection failed");
                false
            }
            Err(e) => {
                error!(code = %event.code, error = %e, "Notification failed");
                false
            }
        }
    }

    /// Dispatch `event` as a detached unit of work.
    ///
    /// The scan loop never awaits the outcome; a failure is logged with the
    /// reminder that the gate was already actuated.
    pub fn dispatch(&self, event: AccessEvent) {
        let dispatcher = self.clone();
        tokio::spawn(async move {
            if !dispatcher.send(&event).await {
                warn!(
                    code = %event.code,
                    "Access event not recorded remotely (gate was actuated regardless)"
                );
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_carries_code_and_direction() {
        let event = AccessEvent::now("A1", Direction::Entry);
        let payload = NotifyPayload {
            code: &event.code,
            direction: event.direction,
        };

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["code"], "A1");
        assert_eq!(json["direction"], "entry");
    }

    #[test]
    fn direction_parses_case_insensitively() {
        assert_eq!("entry".parse::<Direction>().unwrap(), Direction::Entry);
        assert_eq!("Exit".parse::<Direction>().unwrap(), Direction::Exit);
        assert!("sideways".parse::<Direction>().is_err());
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_nonfatal() {
        // Nothing listens on the discard port, so this classifies as a
        // connection failure and must simply return false.
        let dispatcher = NotificationDispatcher::new(
            "http://127.0.0.1:9/access".to_string(),
            Duration::from_millis(500),
        );

        let event = AccessEvent::now("A1", Direction::Entry);
        assert!(!dispatcher.send(&event).await);
    }
}
