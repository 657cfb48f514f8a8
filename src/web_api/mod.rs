//! WebAPI - REST API Endpoints
//!
//! ## Responsibilities
//!
//! - Admin surface for the allow-list (register/list/delete/count)
//! - Recent access events
//! - Health and device status
//!
//! Client authentication is deliberately absent here; it lives in front of
//! this service.

mod routes;

pub use routes::create_router;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::models::HealthResponse;
use crate::state::AppState;

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let store_ok = state.store.ping().await;
    let decoder_ok = state.decoder.health_check().await.unwrap_or(false);

    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        store_connected: store_ok,
        decoder_connected: decoder_ok,
        cached_codes: state.cache.count().await,
    };

    Json(response)
}

/// Device status endpoint
pub async fn device_status(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "device_type": "qrgate",
        "firmware_version": env!("CARGO_PKG_VERSION"),
        "status": if state.controller.is_running().await { "scanning" } else { "stopped" },
        "direction": state.config.direction.as_str(),
    }))
}
