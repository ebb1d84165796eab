//! Health check handlers.

use axum::Json;
use serde::Serialize;

use taxgate_core::timestamp;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Current time, RFC 3339.
    pub timestamp: String,
    /// Service version.
    pub version: String,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: timestamp::format(&timestamp::now()),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
