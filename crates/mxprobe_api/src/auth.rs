//! Request authentication.
//!
//! Callers authenticate with a shared API key carried in the request body.
//! The expected key is loaded once from the process environment at startup
//! and compared without branching on key contents beyond length.

use crate::api_handler::ApiError;
use tracing::debug;

/// Check a caller-supplied key against the configured secret.
///
/// Missing keys, empty configured secrets and mismatches are all the same
/// rejection; the response never reveals which.
pub fn verify_api_key(expected: &str, provided: Option<&str>) -> Result<(), ApiError> {
    let Some(provided) = provided else {
        debug!("request rejected: no api_key in body");
        return Err(ApiError::InvalidApiKey);
    };

    if expected.is_empty() || !constant_time_eq(expected.as_bytes(), provided.as_bytes()) {
        debug!("request rejected: api_key mismatch");
        return Err(ApiError::InvalidApiKey);
    }

    Ok(())
}

/// Byte-wise comparison that does not short-circuit on the first
/// difference. Lengths still leak; key material does not.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
