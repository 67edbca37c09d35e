//! Structural and authority facts about the recipient domain.
//!
//! Pure string/label work lives in free functions; everything that touches
//! the network goes through [`DomainResolver`], which wraps a single
//! hickory resolver with bounded timeouts.

use hickory_resolver::{
    config::{ResolverConfig, ResolverOpts},
    proto::rr::{RData, RecordType},
    TokioAsyncResolver,
};
use std::time::Duration;
use tracing::debug;

/// Split an address into its account and FQDN parts. Callers must have
/// syntax-checked the address first, so the `@` is guaranteed present.
pub fn split_account(address: &str) -> (String, String) {
    match address.split_once('@') {
        Some((account, fqdn)) => (account.to_string(), fqdn.to_string()),
        None => (address.to_string(), String::new()),
    }
}

/// Public-suffix-aware `(subdomain, domain, tld)` sections of an FQDN.
///
/// Multi-label suffixes like `co.uk` parse correctly: `mail.foo.co.uk`
/// yields `("mail", "foo", "co.uk")`. An unparsable name yields three
/// empty strings.
pub fn parse_domain_labels(fqdn: &str) -> (String, String, String) {
    let Ok(name) = addr::parse_domain_name(fqdn) else {
        return (String::new(), String::new(), String::new());
    };

    let tld = name.suffix().to_string();
    let domain = name
        .root()
        .and_then(|root| root.strip_suffix(name.suffix()))
        .map(|d| d.trim_end_matches('.').to_string())
        .unwrap_or_default();
    let subdomain = name.prefix().unwrap_or("").to_string();

    (subdomain, domain, tld)
}

/// The first MX exchange for a domain, followed down to its IP and PTR.
#[derive(Debug, Clone)]
pub struct MxTarget {
    pub host: String,
    pub host_domain: String,
    pub host_tld: String,
    pub ip: String,
    /// Empty when reverse resolution fails; that is non-fatal metadata.
    pub ptr: String,
}

/// The CNAME target of `autodiscover.<fqdn>`.
#[derive(Debug, Clone)]
pub struct AutodiscoverTarget {
    pub host: String,
    pub domain: String,
    pub tld: String,
}

/// DNS lookups for the validation pipeline.
pub struct DomainResolver {
    resolver: TokioAsyncResolver,
}

impl DomainResolver {
    /// Build a resolver against the system configuration with an explicit
    /// per-query timeout and attempt count.
    pub fn new(timeout_ms: u64, attempts: usize) -> Self {
        let mut opts = ResolverOpts::default();
        opts.timeout = Duration::from_millis(timeout_ms);
        opts.attempts = attempts;

        let resolver = TokioAsyncResolver::tokio(ResolverConfig::default(), opts);
        Self { resolver }
    }

    /// Does the registrable domain have NS records? Every failure mode
    /// (NXDOMAIN, no records, timeout, transport error) is uniformly `false`
    /// — a missing name server is a definitive negative fact, not an error.
    pub async fn has_name_servers(&self, registrable: &str) -> bool {
        if registrable.is_empty() {
            return false;
        }
        match self.resolver.ns_lookup(registrable).await {
            Ok(lookup) => lookup.iter().next().is_some(),
            Err(e) => {
                debug!("NS lookup failed for {}: {}", registrable, e);
                false
            }
        }
    }

    /// CNAME at `autodiscover.<fqdn>`. Any failure yields `None`; this is
    /// non-fatal enrichment.
    pub async fn resolve_autodiscover(&self, fqdn: &str) -> Option<AutodiscoverTarget> {
        let name = format!("autodiscover.{fqdn}");
        let lookup = match self.resolver.lookup(name.clone(), RecordType::CNAME).await {
            Ok(lookup) => lookup,
            Err(e) => {
                debug!("autodiscover lookup failed for {}: {}", name, e);
                return None;
            }
        };

        let host = lookup.iter().find_map(|rdata| match rdata {
            RData::CNAME(cname) => Some(cname.to_utf8()),
            _ => None,
        })?;

        let (_, domain, tld) = parse_domain_labels(host.trim_end_matches('.'));
        Some(AutodiscoverTarget { host, domain, tld })
    }

    /// First MX exchange for the FQDN, its A-record IP and the IP's PTR.
    /// Any failure up to the A lookup means "no mail system configured";
    /// a PTR failure only leaves that field empty.
    pub async fn resolve_mx(&self, fqdn: &str) -> Option<MxTarget> {
        let lookup = match self.resolver.mx_lookup(fqdn).await {
            Ok(lookup) => lookup,
            Err(e) => {
                debug!("MX lookup failed for {}: {}", fqdn, e);
                return None;
            }
        };

        let mut exchanges: Vec<_> = lookup
            .iter()
            .map(|mx| (mx.preference(), mx.exchange().to_utf8()))
            .collect();
        exchanges.sort_by_key(|(preference, _)| *preference);

        let (_, exchange) = exchanges.into_iter().next()?;
        let host = exchange.trim_end_matches('.').to_string();
        let (_, host_domain, host_tld) = parse_domain_labels(&host);

        let ip = match self.resolver.lookup_ip(host.clone()).await {
            Ok(lookup) => lookup.iter().next()?,
            Err(e) => {
                debug!("A lookup failed for MX host {}: {}", host, e);
                return None;
            }
        };

        let ptr = match self.resolver.reverse_lookup(ip).await {
            Ok(lookup) => lookup
                .iter()
                .next()
                .map(|name| name.to_utf8().trim_end_matches('.').to_string())
                .unwrap_or_default(),
            Err(e) => {
                debug!("PTR lookup failed for {}: {}", ip, e);
                String::new()
            }
        };

        Some(MxTarget {
            host,
            host_domain,
            host_tld,
            ip: ip.to_string(),
            ptr,
        })
    }
}
