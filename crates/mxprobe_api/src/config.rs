//! Configuration management for the validation API
//!
//! Settings are loaded from defaults, an optional `Config.toml`, and
//! `MXPROBE_`-prefixed environment variables using the figment crate. The
//! API key is a secret and comes exclusively from the environment.

use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub engine: EngineSettings,
    pub observability: ObservabilityConfig,
    #[serde(skip)]
    pub security: SecurityConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address
    pub host: String,
    /// Server port
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

/// Validation engine tunables, passed through to the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    /// DNS resolver timeout in milliseconds
    pub dns_timeout_ms: u64,
    /// Maximum number of DNS lookup attempts
    pub dns_attempts: usize,
    /// Timeout for each SMTP connect and read in milliseconds
    pub smtp_timeout_ms: u64,
    /// TCP port of the mail exchanger, 25 outside of tests
    pub smtp_port: u16,
    /// Overall WHOIS lookup deadline in milliseconds
    pub whois_timeout_ms: u64,
    /// Domain announced in the HELO and MAIL FROM commands
    pub helo_domain: String,
    /// Account name fabricated for the catch-all sub-probe
    pub catch_all_probe_account: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        let defaults = mxprobe_core::EngineConfig::default();
        Self {
            dns_timeout_ms: defaults.dns_timeout_ms,
            dns_attempts: defaults.dns_attempts,
            smtp_timeout_ms: defaults.smtp_timeout_ms,
            smtp_port: defaults.smtp_port,
            whois_timeout_ms: defaults.whois_timeout_ms,
            helo_domain: defaults.helo_domain,
            catch_all_probe_account: defaults.catch_all_probe_account,
        }
    }
}

impl EngineSettings {
    /// Build the pipeline configuration from these settings.
    pub fn to_engine_config(&self) -> mxprobe_core::EngineConfig {
        mxprobe_core::EngineConfig {
            dns_timeout_ms: self.dns_timeout_ms,
            dns_attempts: self.dns_attempts,
            smtp_timeout_ms: self.smtp_timeout_ms,
            smtp_port: self.smtp_port,
            whois_timeout_ms: self.whois_timeout_ms,
            helo_domain: self.helo_domain.clone(),
            catch_all_probe_account: self.catch_all_probe_account.clone(),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Enable JSON structured logging
    pub json_logs: bool,
    /// Log level filter
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            json_logs: false,
            log_level: "info".to_string(),
        }
    }
}

/// Security configuration. Never serialized; the key must not leak into
/// logs or config dumps.
#[derive(Debug, Clone, Default)]
pub struct SecurityConfig {
    /// The shared API key request bodies are checked against.
    pub api_key: String,
}

/// Environment variable names for configuration
#[allow(dead_code)]
pub mod env_vars {
    pub const API_KEY: &str = "MXPROBE_API_KEY";
    pub const SERVER_HOST: &str = "MXPROBE_SERVER__HOST";
    pub const SERVER_PORT: &str = "MXPROBE_SERVER__PORT";
    pub const SMTP_TIMEOUT_MS: &str = "MXPROBE_ENGINE__SMTP_TIMEOUT_MS";
    pub const JSON_LOGS: &str = "MXPROBE_OBSERVABILITY__JSON_LOGS";
    pub const LOG_LEVEL: &str = "MXPROBE_OBSERVABILITY__LOG_LEVEL";
}
