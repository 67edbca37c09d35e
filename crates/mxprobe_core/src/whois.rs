//! Best-effort WHOIS lookup for domain registration age.
//!
//! Queries the IANA root WHOIS, follows a single referral to the registry
//! server, and scans the response for a creation-date line. Every failure
//! (timeout, missing field, unparsable date) degrades to the unknown
//! sentinel rather than an error.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

const IANA_WHOIS_HOST: &str = "whois.iana.org";
const WHOIS_PORT: u16 = 43;

/// Labels that introduce a registration date, lowercase. First match wins.
const CREATION_DATE_LABELS: &[&str] = &[
    "creation date:",
    "created:",
    "created on:",
    "registered on:",
];

/// WHOIS client with one overall deadline per lookup.
pub struct WhoisClient {
    timeout: Duration,
}

impl WhoisClient {
    pub fn new(timeout_ms: u64) -> Self {
        Self {
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    /// Age of the registrable domain in days, or -1 when anything fails.
    pub async fn lookup_age(&self, registrable: &str) -> i64 {
        if registrable.is_empty() {
            return -1;
        }
        match tokio::time::timeout(self.timeout, self.creation_date(registrable)).await {
            Ok(Some(created)) => (Utc::now() - created).num_days(),
            Ok(None) => {
                debug!("no parsable creation date for {}", registrable);
                -1
            }
            Err(_) => {
                debug!("WHOIS lookup timed out for {}", registrable);
                -1
            }
        }
    }

    async fn creation_date(&self, registrable: &str) -> Option<DateTime<Utc>> {
        let root = query_server(IANA_WHOIS_HOST, registrable).await.ok()?;
        let text = match find_referral(&root) {
            Some(server) => query_server(&server, registrable).await.ok()?,
            None => root,
        };
        parse_creation_date(&text)
    }
}

/// One WHOIS round trip: send the domain, read until the server closes.
async fn query_server(server: &str, domain: &str) -> anyhow::Result<String> {
    let mut stream = TcpStream::connect((server, WHOIS_PORT)).await?;
    stream.write_all(format!("{domain}\r\n").as_bytes()).await?;
    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await?;
    Ok(String::from_utf8_lossy(&raw).into_owned())
}

/// Registry server named by a `refer:` or `whois:` line, if any.
fn find_referral(text: &str) -> Option<String> {
    text.lines().find_map(|line| {
        let lower = line.trim().to_lowercase();
        for prefix in ["refer:", "whois:"] {
            if let Some(rest) = lower.strip_prefix(prefix) {
                let server = rest.trim();
                if !server.is_empty() {
                    return Some(server.to_string());
                }
            }
        }
        None
    })
}

/// Scan WHOIS text for a creation-date line and parse its value.
fn parse_creation_date(text: &str) -> Option<DateTime<Utc>> {
    for line in text.lines() {
        let lower = line.to_lowercase();
        for label in CREATION_DATE_LABELS {
            if let Some(position) = lower.find(label) {
                let value = line[position + label.len()..].trim();
                if let Some(parsed) = parse_timestamp(value) {
                    return Some(parsed);
                }
            }
        }
    }
    None
}

/// Parse the handful of timestamp shapes registries actually emit.
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Some(parsed.and_utc());
        }
    }
    for format in ["%Y-%m-%d", "%d-%b-%Y", "%Y.%m.%d", "%d.%m.%Y"] {
        if let Ok(parsed) = NaiveDate::parse_from_str(value, format) {
            return Some(parsed.and_hms_opt(0, 0, 0)?.and_utc());
        }
    }
    None
}
