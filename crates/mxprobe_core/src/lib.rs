//! # mxprobe_core
//!
//! Email deliverability validation engine: syntax checking, DNS and WHOIS
//! enrichment, reputation classification and a raw SMTP handshake probe,
//! combined into a single sequential pipeline.
//!
//! ## Features
//!
//! - **Syntax checking** against a fixed address pattern, before any I/O
//! - **DNS resolution** (NS, MX, A, PTR, autodiscover CNAME) via hickory-resolver
//! - **WHOIS domain age** lookup with referral following, best-effort
//! - **Reputation tables** for role accounts, free providers, disposable
//!   MX IPs, security gateways and provider names
//! - **SMTP probing** of the mail exchanger with a fixed four-command
//!   dialogue and phrase-based status classification
//! - **Catch-all detection** through a second probe with a fabricated
//!   recipient
//!
//! ## Example
//!
//! ```rust,no_run
//! use mxprobe_core::{EngineConfig, ReferenceTables, ValidationPipeline};
//!
//! #[tokio::main]
//! async fn main() {
//!     let pipeline = ValidationPipeline::new(
//!         EngineConfig::default(),
//!         ReferenceTables::builtin(),
//!     );
//!
//!     let record = pipeline.validate("someone@example.com").await;
//!     println!("{:?}: {}", record.status, record.status_detail);
//! }
//! ```

pub mod classify;
pub mod domain;
pub mod pipeline;
pub mod record;
pub mod reputation;
pub mod smtp;
pub mod syntax;
pub mod whois;

pub use pipeline::{EngineConfig, ValidationPipeline};
pub use record::{PhraseMatch, SmtpResponse, Status, ValidationRecord};
pub use reputation::ReferenceTables;
pub use smtp::ProbeError;
pub use whois::WhoisClient;
