//! The validation record built incrementally by the pipeline.
//!
//! One record is created per validation request and mutated only by pipeline
//! stages. Field names double as the snake_case wire names in API
//! responses.

use serde::{Deserialize, Serialize};

/// Final verdict for an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Valid,
    Invalid,
    Disabled,
    LikelyInvalid,
    Unknown,
}

/// One parsed SMTP server reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmtpResponse {
    /// Three-digit reply code, e.g. "250".
    pub code: String,
    /// Extended status subcode, e.g. "2.1.0". Empty when absent.
    pub subcode: String,
    /// Reply text with code, subcode and line terminators stripped.
    pub message: String,
}

/// A phrase from one of the classification lists found in a server reply.
///
/// Matches accumulate across all rules as evidence, independently of which
/// rule ends up owning the status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhraseMatch {
    pub phrase: String,
    pub message: String,
}

/// Everything reported about an email address.
///
/// Created at pipeline start, filled in stage by stage, discarded after
/// serialization. Fields are never removed once set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationRecord {
    /// The address as received.
    pub email: String,

    /// True only for the synthetic bogus-address catch-all sub-probe.
    pub is_catch_all_probe: bool,

    /// Did the input pass the syntax pattern?
    pub is_valid_syntax: bool,

    /// Everything before the `@`.
    pub account: String,

    /// Does the account name belong to a role like `accounting@`?
    pub is_role: bool,

    /// Does the account contain a `+` alias marker?
    pub is_alias: bool,

    /// Account with any `+`-suffix removed.
    pub account_alias_stripped: String,

    /// Full address with the alias stripped.
    pub email_alias_stripped: String,

    /// Everything after the `@`.
    pub fqdn: String,

    /// Public-suffix-aware sections of the FQDN.
    pub subdomain: String,
    pub domain: String,
    pub tld: String,

    /// Age of the domain registration in days. -1 means unknown.
    pub domain_age: i64,

    /// Does the registrable domain have NS records?
    pub has_name_servers: bool,

    /// Does the FQDN have MX records?
    pub has_mx_records: bool,

    /// Target of the first MX record and its parsed sections.
    pub smtp_provider_host: String,
    pub smtp_provider_host_domain: String,
    pub smtp_provider_host_tld: String,

    /// IP resolved from the MX target, and its PTR record.
    pub smtp_provider_ip: String,
    pub smtp_provider_ip_ptr: String,

    /// Is the MX IP on the disposable-provider list?
    pub is_disposable: bool,

    /// Is the domain a known free provider (gmail, yahoo, ...)?
    pub is_free_provider: bool,

    /// CNAME target of `autodiscover.<fqdn>` and its parsed sections.
    pub autodiscover_host: String,
    pub autodiscover_domain: String,
    pub autodiscover_host_tld: String,

    /// Inbound filtering proxy fronting the MX, if recognized.
    pub email_security_gateway: String,

    /// Friendly name of the mailbox provider.
    pub email_provider: String,

    /// Parsed responses from the SMTP handshake; 0 or exactly 4 entries.
    pub smtp_responses: Vec<SmtpResponse>,

    /// Does the mail system accept any recipient?
    pub is_catch_all: bool,

    /// Will soft bounce.
    pub is_mailbox_full: bool,

    /// Phrases from the classification lists found in the responses.
    pub phrase_matches: Vec<PhraseMatch>,

    pub status: Status,
    pub status_detail: String,
}

impl ValidationRecord {
    pub fn new(email: impl Into<String>, is_catch_all_probe: bool) -> Self {
        Self {
            email: email.into(),
            is_catch_all_probe,
            is_valid_syntax: false,
            account: String::new(),
            is_role: false,
            is_alias: false,
            account_alias_stripped: String::new(),
            email_alias_stripped: String::new(),
            fqdn: String::new(),
            subdomain: String::new(),
            domain: String::new(),
            tld: String::new(),
            domain_age: -1,
            has_name_servers: false,
            has_mx_records: false,
            smtp_provider_host: String::new(),
            smtp_provider_host_domain: String::new(),
            smtp_provider_host_tld: String::new(),
            smtp_provider_ip: String::new(),
            smtp_provider_ip_ptr: String::new(),
            is_disposable: false,
            is_free_provider: false,
            autodiscover_host: String::new(),
            autodiscover_domain: String::new(),
            autodiscover_host_tld: String::new(),
            email_security_gateway: String::new(),
            email_provider: String::new(),
            smtp_responses: Vec::new(),
            is_catch_all: false,
            is_mailbox_full: false,
            phrase_matches: Vec::new(),
            status: Status::Unknown,
            status_detail: String::new(),
        }
    }

    /// Terminate the pipeline with a definitive verdict.
    pub(crate) fn finish(&mut self, status: Status, detail: &str) {
        self.status = status;
        self.status_detail = detail.to_string();
    }
}
