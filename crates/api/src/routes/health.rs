//! Liveness and readiness probes.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::app::AppState;
use crate::error::ApiError;

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// GET /api/health/live
pub async fn live() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "alive",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET /api/health/ready
///
/// Returns 503 while the program store cannot be reached.
pub async fn ready(State(state): State<AppState>) -> Result<Json<StatusResponse>, ApiError> {
    if state.programs.ping().await {
        Ok(Json(StatusResponse {
            status: "ready",
            version: env!("CARGO_PKG_VERSION"),
        }))
    } else {
        Err(ApiError::ServiceUnavailable(
            "Program store unavailable".to_string(),
        ))
    }
}
