//! Application state
//!
//! Holds all shared components and state

use crate::access_log::AccessLog;
use crate::actuator::OutputActuator;
use crate::allow_list::{AllowListCache, AllowListStore};
use crate::decoder::DecoderClient;
use crate::gate_controller::GateController;
use crate::notifier::Direction;
use std::path::PathBuf;
use std::sync::Arc;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Remote keyed store URL
    pub redis_url: String,
    /// Allow-list namespace prefix
    pub key_prefix: String,
    /// Notification endpoint for access events
    pub notify_url: String,
    /// External decode service URL
    pub decoder_url: String,
    /// Capture device node
    pub video_device: PathBuf,
    /// GPIO chip for the gate output
    pub gpio_chip: String,
    /// GPIO line offset for the gate output
    pub gpio_line: u32,
    /// Log transitions instead of driving hardware
    pub simulate_output: bool,
    /// Seconds the output stays high per pulse
    pub pulse_secs: u64,
    /// Seconds the same code is suppressed after admission
    pub debounce_secs: u64,
    /// Seconds between allow-list snapshot refreshes
    pub cache_refresh_secs: u64,
    /// Milliseconds between scan iterations
    pub scan_interval_ms: u64,
    /// Notification request timeout
    pub notify_timeout_secs: u64,
    /// Store connect/liveness timeout
    pub store_timeout_secs: u64,
    /// Direction stamped on access events from this gate
    pub direction: Direction,
    /// Admin API host
    pub host: String,
    /// Admin API port
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379/1".to_string()),
            key_prefix: std::env::var("KEY_PREFIX").unwrap_or_else(|_| "qrcodes".to_string()),
            notify_url: std::env::var("NOTIFY_URL")
                .unwrap_or_else(|_| "https://api.example.com/access".to_string()),
            decoder_url: std::env::var("DECODER_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:9100".to_string()),
            video_device: std::env::var("VIDEO_DEVICE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("/dev/video0")),
            gpio_chip: std::env::var("GPIO_CHIP").unwrap_or_else(|_| "gpiochip0".to_string()),
            gpio_line: std::env::var("GPIO_LINE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(23),
            simulate_output: std::env::var("SIMULATE_OUTPUT")
                .ok()
                .map(|v| v == "true")
                .unwrap_or(false),
            pulse_secs: std::env::var("PULSE_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
            debounce_secs: std::env::var("DEBOUNCE_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(6),
            cache_refresh_secs: std::env::var("CACHE_REFRESH_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            scan_interval_ms: std::env::var("SCAN_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(100),
            notify_timeout_secs: std::env::var("NOTIFY_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            store_timeout_secs: std::env::var("STORE_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
            direction: std::env::var("GATE_DIRECTION")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(Direction::Entry),
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Application config
    pub config: AppConfig,
    /// Remote keyed store (admin surface writes/reads)
    pub store: Arc<AllowListStore>,
    /// AllowListCache (controller hot path)
    pub cache: Arc<AllowListCache>,
    /// Decode service adapter
    pub decoder: Arc<DecoderClient>,
    /// Gate output
    pub actuator: Arc<OutputActuator>,
    /// Recent admissions
    pub access_log: Arc<AccessLog>,
    /// The scan loop
    pub controller: Arc<GateController>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_gate_constants() {
        let config = AppConfig::default();
        assert_eq!(config.pulse_secs, 5);
        assert_eq!(config.debounce_secs, 6);
        assert_eq!(config.cache_refresh_secs, 30);
        assert_eq!(config.key_prefix, "qrcodes");
        assert_eq!(config.direction, Direction::Entry);
    }
}
