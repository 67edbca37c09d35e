//! The validation pipeline: every stage in order, short-circuiting on
//! definitive negatives.
//!
//! A pipeline instance owns its resolver, WHOIS client and SMTP probe and
//! is shared across requests behind an `Arc`. Stages mutate one
//! [`ValidationRecord`] in sequence; once a terminal verdict is reached the
//! remaining stages are skipped and the record is returned as-is.

use crate::classify;
use crate::domain::{self, DomainResolver};
use crate::record::{Status, ValidationRecord};
use crate::reputation::ReferenceTables;
use crate::smtp::SmtpProbe;
use crate::syntax;
use crate::whois::WhoisClient;
use tracing::{debug, info, warn};

pub const DETAIL_BAD_SYNTAX: &str = "email address did not pass the syntax check";
pub const DETAIL_NO_NAME_SERVERS: &str = "email domain does not have name servers";
pub const DETAIL_NO_MX: &str = "email domain does not have emails set up";
pub const DETAIL_CONNECTION_FAILED: &str =
    "we encountered an error while trying to connect with the email provider";

/// Tunables for the network stages.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Per-query DNS timeout.
    pub dns_timeout_ms: u64,
    /// DNS retransmission attempts per query.
    pub dns_attempts: usize,
    /// Timeout for each SMTP connect and read.
    pub smtp_timeout_ms: u64,
    /// TCP port of the mail exchanger, 25 outside of tests.
    pub smtp_port: u16,
    /// Overall deadline for a WHOIS lookup.
    pub whois_timeout_ms: u64,
    /// Domain announced in HELO and used as the MAIL FROM host.
    pub helo_domain: String,
    /// Account name fabricated for the catch-all sub-probe. Long and
    /// random enough that no real mailbox plausibly carries it.
    pub catch_all_probe_account: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dns_timeout_ms: 2000,
            dns_attempts: 2,
            smtp_timeout_ms: 10_000,
            smtp_port: 25,
            whois_timeout_ms: 2000,
            helo_domain: "fancydomain.com".to_string(),
            catch_all_probe_account: "34cq0f89unymc43fn0um".to_string(),
        }
    }
}

/// Runs every validation stage for an address.
pub struct ValidationPipeline {
    config: EngineConfig,
    tables: ReferenceTables,
    resolver: DomainResolver,
    whois: WhoisClient,
    probe: SmtpProbe,
}

impl ValidationPipeline {
    pub fn new(config: EngineConfig, tables: ReferenceTables) -> Self {
        let resolver = DomainResolver::new(config.dns_timeout_ms, config.dns_attempts);
        let whois = WhoisClient::new(config.whois_timeout_ms);
        let probe = SmtpProbe::new(
            config.smtp_timeout_ms,
            config.helo_domain.clone(),
            config.smtp_port,
        );
        Self {
            config,
            tables,
            resolver,
            whois,
            probe,
        }
    }

    /// Validate one address and return the completed record.
    pub async fn validate(&self, email: &str) -> ValidationRecord {
        let mut record = ValidationRecord::new(email, false);
        self.run(&mut record).await;
        info!(
            email = %record.email,
            status = ?record.status,
            "validation finished"
        );
        record
    }

    async fn run(&self, record: &mut ValidationRecord) {
        // Stage 1: shape. A malformed address never reaches the network.
        record.is_valid_syntax = syntax::check(&record.email);
        if !record.is_valid_syntax {
            record.finish(Status::Invalid, DETAIL_BAD_SYNTAX);
            return;
        }

        // Stage 2: structural facts, all derived locally.
        let (account, fqdn) = domain::split_account(&record.email);
        record.is_role = self.tables.is_role_account(&account);
        record.is_alias = account.contains('+');
        record.account_alias_stripped = account
            .split('+')
            .next()
            .unwrap_or(account.as_str())
            .to_string();
        record.email_alias_stripped = format!("{}@{}", record.account_alias_stripped, fqdn);
        record.account = account;
        record.fqdn = fqdn;

        let (subdomain, domain, tld) = domain::parse_domain_labels(&record.fqdn);
        record.subdomain = subdomain;
        record.domain = domain;
        record.tld = tld;
        record.is_free_provider = self.tables.is_free_provider(&record.fqdn);

        let registrable = if record.domain.is_empty() {
            record.fqdn.clone()
        } else {
            format!("{}.{}", record.domain, record.tld)
        };
        record.domain_age = self.whois.lookup_age(&registrable).await;

        // Stage 3: authority. No name servers means nothing else can exist.
        record.has_name_servers = self.resolver.has_name_servers(&registrable).await;
        if !record.has_name_servers {
            record.finish(Status::Invalid, DETAIL_NO_NAME_SERVERS);
            return;
        }

        // Stage 4: mail system discovery.
        if let Some(target) = self.resolver.resolve_autodiscover(&record.fqdn).await {
            record.autodiscover_host = target.host;
            record.autodiscover_domain = target.domain;
            record.autodiscover_host_tld = target.tld;
        }

        let Some(mx) = self.resolver.resolve_mx(&record.fqdn).await else {
            record.finish(Status::Invalid, DETAIL_NO_MX);
            return;
        };
        record.smtp_provider_host = mx.host;
        record.smtp_provider_host_domain = mx.host_domain;
        record.smtp_provider_host_tld = mx.host_tld;
        record.smtp_provider_ip = mx.ip;
        record.smtp_provider_ip_ptr = mx.ptr;
        record.has_mx_records = true;

        // Stage 5: reputation, all table lookups.
        record.is_disposable = self.tables.is_disposable(&record.smtp_provider_ip);
        record.email_security_gateway = self
            .tables
            .security_gateway(&record.smtp_provider_host_domain);
        record.email_provider = self.tables.provider_name(
            &record.email_security_gateway,
            &record.autodiscover_domain,
            &record.smtp_provider_host_domain,
        );

        // Stage 6: the handshake itself.
        match self
            .probe
            .probe(&record.smtp_provider_host, &record.email)
            .await
        {
            Ok(responses) => record.smtp_responses = responses,
            Err(e) => {
                warn!(
                    mx_host = %record.smtp_provider_host,
                    error = %e,
                    "SMTP probe failed"
                );
                record.finish(Status::Unknown, DETAIL_CONNECTION_FAILED);
                return;
            }
        }

        // Stage 7: classification. An accepted recipient triggers the
        // catch-all sub-probe first, because acceptance alone cannot tell a
        // real mailbox from an accept-everything mail system.
        let catch_all_confirmed = match record.smtp_responses.get(3) {
            Some(fourth) if classify::is_deliverable_code(&fourth.code) => {
                self.run_catch_all_probe(&record.fqdn).await
            }
            _ => None,
        };
        classify::apply_rules(record, &self.tables, catch_all_confirmed);
    }

    /// Probe the same mail system with a fabricated recipient.
    ///
    /// `Some(accepted)` reports whether the bogus address got a 250/251 on
    /// the RCPT TO exchange; `None` means the sub-probe itself failed and
    /// catch-all status stays undetermined.
    async fn run_catch_all_probe(&self, fqdn: &str) -> Option<bool> {
        let bogus = format!("{}@{}", self.config.catch_all_probe_account, fqdn);
        debug!(%fqdn, "running catch-all sub-probe");

        let mx = self.resolver.resolve_mx(fqdn).await?;
        let responses = match self.probe.probe(&mx.host, &bogus).await {
            Ok(responses) => responses,
            Err(e) => {
                debug!(%fqdn, error = %e, "catch-all sub-probe failed");
                return None;
            }
        };
        let fourth = responses.get(3)?;
        Some(classify::is_deliverable_code(&fourth.code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pipeline() -> ValidationPipeline {
        ValidationPipeline::new(EngineConfig::default(), ReferenceTables::builtin())
    }

    #[tokio::test]
    async fn malformed_address_never_touches_the_network() {
        let record = pipeline().validate("not-an-email").await;
        assert!(!record.is_valid_syntax);
        assert_eq!(record.status, Status::Invalid);
        assert_eq!(record.status_detail, DETAIL_BAD_SYNTAX);
        // Later stages never ran.
        assert!(record.account.is_empty());
        assert!(record.fqdn.is_empty());
        assert!(record.smtp_responses.is_empty());
    }

    #[tokio::test]
    async fn empty_input_is_invalid_syntax() {
        let record = pipeline().validate("").await;
        assert_eq!(record.status, Status::Invalid);
        assert_eq!(record.status_detail, DETAIL_BAD_SYNTAX);
    }

    #[test]
    fn default_config_matches_probe_conventions() {
        let config = EngineConfig::default();
        assert_eq!(config.helo_domain, "fancydomain.com");
        assert_eq!(config.catch_all_probe_account.len(), 20);
        assert_eq!(config.smtp_port, 25);
    }

    #[tokio::test]
    #[ignore = "requires network access"]
    async fn domain_without_mx_records_short_circuits_before_the_probe() {
        // example.com keeps name servers but accepts no mail.
        let record = pipeline().validate("someone@example.com").await;
        assert!(record.has_name_servers);
        assert!(!record.has_mx_records);
        assert_eq!(record.status, Status::Invalid);
        assert_eq!(record.status_detail, DETAIL_NO_MX);
        assert!(record.smtp_responses.is_empty());
    }

    #[tokio::test]
    #[ignore = "requires network access"]
    async fn unreachable_mail_exchanger_degrades_to_unknown() {
        // Point the probe at a port no mail exchanger listens on, so the
        // dialogue can never start.
        let config = EngineConfig {
            smtp_port: 2525,
            smtp_timeout_ms: 1000,
            ..EngineConfig::default()
        };
        let pipeline = ValidationPipeline::new(config, ReferenceTables::builtin());

        let record = pipeline.validate("cansinacarer@gmail.com").await;
        assert!(record.has_mx_records);
        assert!(record.smtp_responses.is_empty());
        assert_eq!(record.status, Status::Unknown);
        assert_eq!(record.status_detail, DETAIL_CONNECTION_FAILED);
    }

    #[tokio::test]
    #[ignore = "requires network access"]
    async fn gmail_address_resolves_and_classifies() {
        let record = pipeline().validate("cansinacarer@gmail.com").await;
        assert!(record.is_valid_syntax);
        assert!(record.has_name_servers);
        assert!(record.has_mx_records);
        assert!(record.is_free_provider);
        assert_eq!(record.smtp_provider_host_domain, "google");
        assert_eq!(record.smtp_responses.len(), 4);
    }

    #[tokio::test]
    #[ignore = "requires network access"]
    async fn nonexistent_domain_short_circuits_on_name_servers() {
        let record = pipeline()
            .validate("someone@this-domain-definitely-does-not-exist-12345.com")
            .await;
        assert_eq!(record.status, Status::Invalid);
        assert_eq!(record.status_detail, DETAIL_NO_NAME_SERVERS);
        assert!(!record.has_mx_records);
    }
}
