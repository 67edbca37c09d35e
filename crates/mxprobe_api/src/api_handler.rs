//! Shared API types and utilities
//!
//! Request/response types, error handling and the redacted response
//! projection used by the validation endpoint.

use axum::{http::StatusCode, response::Json};
use mxprobe_core::{Status, ValidationRecord};
use serde::{Deserialize, Serialize};

/// Request body for POST /validate
#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    /// Address to validate
    pub email: Option<String>,
    /// Shared secret authenticating the caller
    pub api_key: Option<String>,
    /// Include probe internals in the response
    #[serde(default)]
    pub debug: bool,
}

/// The validation record as shown to non-debug callers.
///
/// Probe internals are omitted entirely rather than nulled: the fields
/// `autodiscover_host`, `autodiscover_domain`, `autodiscover_host_tld`,
/// `is_catch_all_probe`, `phrase_matches` and `smtp_responses` never
/// appear in the serialized output.
#[derive(Debug, Serialize)]
pub struct PublicValidationResponse {
    pub email: String,
    pub is_valid_syntax: bool,
    pub account: String,
    pub is_role: bool,
    pub is_alias: bool,
    pub account_alias_stripped: String,
    pub email_alias_stripped: String,
    pub fqdn: String,
    pub subdomain: String,
    pub domain: String,
    pub tld: String,
    pub domain_age: i64,
    pub has_name_servers: bool,
    pub has_mx_records: bool,
    pub smtp_provider_host: String,
    pub smtp_provider_host_domain: String,
    pub smtp_provider_host_tld: String,
    pub smtp_provider_ip: String,
    pub smtp_provider_ip_ptr: String,
    pub is_disposable: bool,
    pub is_free_provider: bool,
    pub email_security_gateway: String,
    pub email_provider: String,
    pub is_catch_all: bool,
    pub is_mailbox_full: bool,
    pub status: Status,
    pub status_detail: String,
}

impl From<ValidationRecord> for PublicValidationResponse {
    fn from(record: ValidationRecord) -> Self {
        Self {
            email: record.email,
            is_valid_syntax: record.is_valid_syntax,
            account: record.account,
            is_role: record.is_role,
            is_alias: record.is_alias,
            account_alias_stripped: record.account_alias_stripped,
            email_alias_stripped: record.email_alias_stripped,
            fqdn: record.fqdn,
            subdomain: record.subdomain,
            domain: record.domain,
            tld: record.tld,
            domain_age: record.domain_age,
            has_name_servers: record.has_name_servers,
            has_mx_records: record.has_mx_records,
            smtp_provider_host: record.smtp_provider_host,
            smtp_provider_host_domain: record.smtp_provider_host_domain,
            smtp_provider_host_tld: record.smtp_provider_host_tld,
            smtp_provider_ip: record.smtp_provider_ip,
            smtp_provider_ip_ptr: record.smtp_provider_ip_ptr,
            is_disposable: record.is_disposable,
            is_free_provider: record.is_free_provider,
            email_security_gateway: record.email_security_gateway,
            email_provider: record.email_provider,
            is_catch_all: record.is_catch_all,
            is_mailbox_full: record.is_mailbox_full,
            status: record.status,
            status_detail: record.status_detail,
        }
    }
}

/// Error response structure
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub timestamp: String,
}

/// API error types
#[derive(Debug)]
pub enum ApiError {
    /// Body was not valid JSON or had wrong field types
    MalformedBody(String),
    /// `email` field absent from the body
    MissingEmail,
    /// `api_key` field absent or not matching the configured secret
    InvalidApiKey,
}

impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error, message) = match self {
            ApiError::MalformedBody(detail) => (
                StatusCode::BAD_REQUEST,
                "Invalid JSON format",
                Some(detail),
            ),
            ApiError::MissingEmail => {
                (StatusCode::BAD_REQUEST, "Email parameter is missing", None)
            }
            ApiError::InvalidApiKey => (StatusCode::UNAUTHORIZED, "Invalid API key", None),
        };

        let body = ErrorResponse {
            error: error.to_string(),
            message,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mxprobe_core::{PhraseMatch, SmtpResponse};
    use pretty_assertions::assert_eq;

    fn record_with_internals() -> ValidationRecord {
        let mut record = ValidationRecord::new("someone@example.com", false);
        record.autodiscover_host = "autodiscover.outlook.com.".to_string();
        record.phrase_matches.push(PhraseMatch {
            phrase: "mailbox full".to_string(),
            message: "mailbox full".to_string(),
        });
        record.smtp_responses.push(SmtpResponse {
            code: "220".to_string(),
            subcode: String::new(),
            message: "ready".to_string(),
        });
        record
    }

    #[test]
    fn public_response_omits_probe_internals() {
        let response = PublicValidationResponse::from(record_with_internals());
        let json = serde_json::to_value(&response).unwrap();
        let object = json.as_object().unwrap();

        for hidden in [
            "autodiscover_host",
            "autodiscover_domain",
            "autodiscover_host_tld",
            "is_catch_all_probe",
            "phrase_matches",
            "smtp_responses",
        ] {
            assert!(!object.contains_key(hidden), "{hidden} should be omitted");
        }
        assert_eq!(object["email"], "someone@example.com");
        assert_eq!(object["status"], "unknown");
    }

    #[test]
    fn debug_serialization_keeps_probe_internals() {
        let json = serde_json::to_value(record_with_internals()).unwrap();
        let object = json.as_object().unwrap();
        assert!(object.contains_key("smtp_responses"));
        assert!(object.contains_key("phrase_matches"));
        assert_eq!(object["is_catch_all_probe"], false);
    }

    #[test]
    fn request_body_tolerates_missing_fields() {
        let request: ValidateRequest = serde_json::from_str("{}").unwrap();
        assert!(request.email.is_none());
        assert!(request.api_key.is_none());
        assert!(!request.debug);
    }
}
