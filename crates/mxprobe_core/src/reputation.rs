//! Reputation classification against externally supplied lookup tables.
//!
//! Everything in here is a pure lookup: no network I/O, no mutation. The
//! tables are built once at process startup and passed into the pipeline,
//! so tests can substitute their own deterministic sets.

use std::collections::{HashMap, HashSet};

/// Read-only reference data consulted by the classifier stages.
#[derive(Debug, Clone)]
pub struct ReferenceTables {
    /// Account names that belong to a role (`admin`, `support`, ...).
    pub role_accounts: HashSet<String>,
    /// Domains of free mailbox providers (`gmail.com`, ...).
    pub free_provider_domains: HashSet<String>,
    /// Mail-exchanger IPs of disposable providers. Keyed on the MX IP
    /// rather than the sending domain: disposable services rotate through
    /// lookalike domains but keep shared receiving infrastructure.
    pub disposable_mx_ips: HashSet<String>,
    /// MX second-level domain -> inbound security gateway name.
    pub security_gateways: HashMap<String, String>,
    /// Autodiscover second-level domain -> provider friendly name.
    pub provider_names_by_autodiscover_domain: HashMap<String, String>,
    /// MX second-level domain -> provider friendly name.
    pub provider_names_by_mx_domain: HashMap<String, String>,

    /// Phrase lists for the SMTP status rule cascade.
    pub account_disabled_phrases: Vec<String>,
    pub mailbox_full_phrases: Vec<String>,
    pub invalid_address_phrases: Vec<String>,
    pub blacklisted_phrases: Vec<String>,
}

impl ReferenceTables {
    /// Tables shipped with the crate. Role-account and free-provider sets
    /// are embedded text files; the smaller maps live in code below.
    pub fn builtin() -> Self {
        Self {
            role_accounts: parse_list(include_str!("../data/role_accounts.txt")),
            free_provider_domains: parse_list(include_str!("../data/free_providers.txt")),
            disposable_mx_ips: DISPOSABLE_MX_IPS.iter().map(|s| s.to_string()).collect(),
            security_gateways: to_map(SECURITY_GATEWAYS),
            provider_names_by_autodiscover_domain: to_map(PROVIDERS_BY_AUTODISCOVER_DOMAIN),
            provider_names_by_mx_domain: to_map(PROVIDERS_BY_MX_DOMAIN),
            account_disabled_phrases: to_phrases(ACCOUNT_DISABLED_PHRASES),
            mailbox_full_phrases: to_phrases(MAILBOX_FULL_PHRASES),
            invalid_address_phrases: to_phrases(INVALID_ADDRESS_PHRASES),
            blacklisted_phrases: to_phrases(BLACKLISTED_PHRASES),
        }
    }

    pub fn is_role_account(&self, account: &str) -> bool {
        self.role_accounts.contains(&account.to_lowercase())
    }

    pub fn is_free_provider(&self, fqdn: &str) -> bool {
        self.free_provider_domains.contains(&fqdn.to_lowercase())
    }

    pub fn is_disposable(&self, mx_ip: &str) -> bool {
        !mx_ip.is_empty() && self.disposable_mx_ips.contains(mx_ip)
    }

    /// Gateway name for the MX second-level domain, empty if unrecognized.
    pub fn security_gateway(&self, mx_host_domain: &str) -> String {
        self.security_gateways
            .get(mx_host_domain)
            .cloned()
            .unwrap_or_default()
    }

    /// Friendly provider name. Under a security gateway the MX reveals only
    /// the gateway, so the autodiscover CNAME's domain is preferred; the MX
    /// second-level domain is the fallback key, and an unrecognized MX
    /// domain is returned as-is.
    pub fn provider_name(
        &self,
        security_gateway: &str,
        autodiscover_domain: &str,
        mx_host_domain: &str,
    ) -> String {
        if !security_gateway.is_empty() {
            if let Some(name) = self
                .provider_names_by_autodiscover_domain
                .get(autodiscover_domain)
            {
                return name.clone();
            }
        }
        self.provider_names_by_mx_domain
            .get(mx_host_domain)
            .cloned()
            .unwrap_or_else(|| mx_host_domain.to_string())
    }
}

impl Default for ReferenceTables {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Parse an embedded list file: one entry per line, `#` comments.
fn parse_list(content: &str) -> HashSet<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| line.to_lowercase())
        .collect()
}

fn to_map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

fn to_phrases(phrases: &[&str]) -> Vec<String> {
    phrases.iter().map(|phrase| phrase.to_string()).collect()
}

/// Receiving IPs shared by throwaway-address services.
const DISPOSABLE_MX_IPS: &[&str] = &[
    "64.98.36.4",
    "66.175.222.12",
    "91.194.91.211",
    "134.209.221.234",
    "167.172.32.188",
    "172.67.145.58",
    "185.164.136.26",
];

/// MX second-level domains of inbound filtering proxies.
const SECURITY_GATEWAYS: &[(&str, &str)] = &[
    ("pphosted", "Proofpoint"),
    ("ppe-hosted", "Proofpoint"),
    ("gpphosted", "Proofpoint"),
    ("mimecast", "Mimecast"),
    ("barracudanetworks", "Barracuda"),
    ("iphmx", "Cisco"),
    ("hes", "Trend Micro"),
    ("mailcontrol", "Forcepoint"),
];

const PROVIDERS_BY_AUTODISCOVER_DOMAIN: &[(&str, &str)] = &[
    ("outlook", "Microsoft 365"),
    ("office365", "Microsoft 365"),
    ("google", "Google Workspace"),
    ("googlemail", "Google Workspace"),
    ("zoho", "Zoho Mail"),
    ("secureserver", "GoDaddy"),
];

const PROVIDERS_BY_MX_DOMAIN: &[(&str, &str)] = &[
    ("google", "Google Workspace"),
    ("googlemail", "Google Workspace"),
    ("outlook", "Microsoft 365"),
    ("hotmail", "Microsoft"),
    ("yahoodns", "Yahoo"),
    ("zoho", "Zoho Mail"),
    ("secureserver", "GoDaddy"),
    ("emailsrvr", "Rackspace"),
    ("icloud", "Apple iCloud"),
    ("protonmail", "Proton Mail"),
    ("messagingengine", "Fastmail"),
    ("mail", "Mail.ru"),
];

/// The provider confirmed the account exists but is shut off.
const ACCOUNT_DISABLED_PHRASES: &[&str] = &[
    "account disabled",
    "account has been disabled",
    "account inactive",
    "disabled",
    "suspended",
    "deactivated",
];

/// Address exists; deliveries will soft-bounce until space frees up.
const MAILBOX_FULL_PHRASES: &[&str] = &[
    "mailbox full",
    "mailbox is full",
    "over quota",
    "quota exceeded",
    "insufficient system storage",
    "user has exhausted allowed storage space",
];

/// The provider confirmed the address does not exist.
const INVALID_ADDRESS_PHRASES: &[&str] = &[
    "does not exist",
    "no such user",
    "no such recipient",
    "user unknown",
    "unknown user",
    "unknown recipient",
    "recipient not found",
    "user not found",
    "mailbox not found",
    "no mailbox",
    "invalid recipient",
    "invalid mailbox",
    "address rejected",
    "recipient rejected",
];

/// The provider is refusing to talk to us, not judging the address.
const BLACKLISTED_PHRASES: &[&str] = &[
    "blacklist",
    "blacklisted",
    "blocked using",
    "spamhaus",
    "banned sending ip",
    "access denied",
    "poor reputation",
    "rate limited",
    "too many connections",
    "try again later",
    "greylisted",
    "listed at",
];
