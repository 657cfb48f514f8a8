//! API Routes

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::error::{Error, Result};
use crate::models::{ApiResponse, CodeCountResponse, CodeListResponse, RegisterCodeRequest};
use crate::state::AppState;

/// Create API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health & Status
        .route("/healthz", get(super::health_check))
        .route("/api/status", get(super::device_status))
        // Allow-list codes
        .route("/api/codes", get(list_codes).post(register_code))
        .route("/api/codes/count", get(count_codes))
        .route("/api/codes/:code", delete(remove_code))
        // Access events
        .route("/api/events", get(list_events))
        .with_state(state)
}

/// Register a new code (409 when it already exists)
async fn register_code(
    State(state): State<AppState>,
    Json(req): Json<RegisterCodeRequest>,
) -> Result<impl IntoResponse> {
    let code = req.code.trim();
    if code.is_empty() {
        return Err(Error::Validation("code must not be empty".to_string()));
    }

    if !state.store.register(code).await? {
        return Err(Error::Conflict(format!("Code {code} already registered")));
    }

    tracing::info!(code = %code, "Code registered");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(json!({ "code": code }))),
    ))
}

/// List all registered codes (straight from the store, not the snapshot)
async fn list_codes(State(state): State<AppState>) -> Result<Json<CodeListResponse>> {
    let mut codes: Vec<String> = state.store.fetch_all().await?.into_iter().collect();
    codes.sort();

    Ok(Json(CodeListResponse {
        total: codes.len(),
        codes,
    }))
}

/// Delete a code (404 when absent)
async fn remove_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>> {
    if !state.store.remove(&code).await? {
        return Err(Error::NotFound(format!("Code {code} not found")));
    }

    tracing::info!(code = %code, "Code removed");
    Ok(Json(ApiResponse::success(json!({ "code": code }))))
}

/// Count registered codes
async fn count_codes(State(state): State<AppState>) -> Result<Json<CodeCountResponse>> {
    let total = state.store.count().await?;
    Ok(Json(CodeCountResponse { total }))
}

#[derive(Debug, Deserialize)]
struct EventsQuery {
    limit: Option<usize>,
}

/// Latest access events, newest first
async fn list_events(
    State(state): State<AppState>,
    Query(params): Query<EventsQuery>,
) -> impl IntoResponse {
    let limit = params.limit.unwrap_or(50);
    let events = state.access_log.latest(limit).await;
    let total = events.len();
    Json(json!({
        "events": events,
        "total": total,
    }))
}
