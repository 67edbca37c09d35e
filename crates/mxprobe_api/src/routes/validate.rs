//! The validation endpoint.
//!
//! Authenticates the caller, runs the full pipeline for the submitted
//! address and serializes the record; non-debug callers get the redacted
//! projection, debug callers get the complete record including probe
//! internals.

use crate::{
    api_handler::{ApiError, PublicValidationResponse, ValidateRequest},
    auth, AppState,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// POST /validate
///
/// Body: `{"email": "...", "api_key": "...", "debug": false}`.
///
/// Responds 401 on a bad key, 400 on a malformed body or missing email,
/// and 200 with the serialized validation record otherwise. Validation
/// itself never fails the request; unreachable providers surface as
/// `status=unknown` inside a 200.
#[instrument(skip_all, fields(request_id))]
pub async fn validate_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ValidateRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let request_id = Uuid::new_v4().to_string();
    tracing::Span::current().record("request_id", &request_id);

    let Json(request) = payload.map_err(|rejection| {
        warn!("rejected malformed body: {}", rejection.body_text());
        ApiError::MalformedBody(rejection.body_text())
    })?;

    auth::verify_api_key(&state.config.security.api_key, request.api_key.as_deref())?;

    let Some(email) = request.email else {
        warn!("request body carried no email field");
        return Err(ApiError::MissingEmail);
    };

    info!("validating address: {}", email);
    let start_time = std::time::Instant::now();

    let record = state.pipeline.validate(&email).await;

    debug!("validation completed in {:?}", start_time.elapsed());
    info!(
        "address validation completed: {} -> status={:?}",
        email, record.status
    );

    if request.debug {
        Ok(Json(record).into_response())
    } else {
        Ok(Json(PublicValidationResponse::from(record)).into_response())
    }
}
