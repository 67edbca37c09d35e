//! API Routes Module
//!
//! This module organizes all HTTP endpoints:
//! - `validate`: the authenticated validation endpoint
//! - `status`: liveness check
//!
//! Everything else falls through to a 405 response.

pub mod status;
pub mod validate;

use crate::AppState;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::sync::Arc;

/// Build all API routes and return a configured Router
pub fn build_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/validate", post(validate::validate_handler))
        .route("/status", get(status::status_handler))
        .fallback(not_allowed_handler)
        .with_state(state)
}

/// Catch-all for unmatched routes and methods.
async fn not_allowed_handler() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({ "message": "Not allowed" })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fallback_is_405_not_allowed() {
        let response = not_allowed_handler().await.into_response();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
