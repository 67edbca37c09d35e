//! Liveness route.

use axum::response::Json;
use serde::Serialize;

/// Status response
#[derive(Serialize)]
pub struct StatusResponse {
    pub status: String,
    pub version: String,
}

/// Status endpoint - GET /status
///
/// Returns 200 whenever the process is serving requests. No downstream
/// checks; the pipeline holds no connections to verify.
pub async fn status_handler() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "OK".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
