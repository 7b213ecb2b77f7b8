//! Health check endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub queue_depth: usize,
    pub version: &'static str,
}

/// `GET /api/health` — liveness check plus queue depth.
pub async fn check(State(ctx): State<ApiContext>) -> Result<Json<HealthResponse>, ApiError> {
    let queue = ctx.queue.status();
    Ok(Json(HealthResponse {
        status: "ok",
        queue_depth: queue.queue_depth,
        version: crate::config::APP_VERSION,
    }))
}
