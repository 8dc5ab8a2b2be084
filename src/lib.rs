//! dns_recon library: DNS resolution for reconnaissance scans
//!
//! This library resolves hostnames and addresses while detecting wildcard
//! DNS, which would otherwise flood a scan with subdomains that only exist
//! because a parent answers for every name. It provides:
//! - Forward and reverse lookups with an LRU record cache and retries
//! - A per-parent circuit breaker backed by a connectivity probe
//! - Bounded-concurrency batch resolution as a lazy stream
//! - Wildcard detection per host and per record type, with event tagging
//!
//! # Example
//!
//! ```no_run
//! use dns_recon::{DnsEngine, EngineConfig, RecordTypeSelector};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = DnsEngine::with_resolver(EngineConfig::default())?;
//!
//! let ips = engine.resolve("one.one.one.one", RecordTypeSelector::Default).await?;
//! println!("one.one.one.one resolves to {ips:?}");
//!
//! let verdict = engine.is_wildcard("asdf.github.io", None, None).await?;
//! for (rdtype, status) in verdict {
//!     println!("{rdtype}: wildcard={:?} (parent {})", status.is_wildcard, status.parent);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

#![warn(missing_docs)]

pub mod config;
pub mod dns;
pub mod domain;
pub mod error_handling;
pub mod initialization;
pub mod ops;

// Re-export public API
pub use config::{EngineConfig, LogFormat, LogLevel};
pub use dns::{
    extract_targets, DnsClient, DnsEngine, DnsRecord, EventKind, EventRef, EventResolution,
    ExtractedResolution, HickoryClient, MockClient, MockData, Query, RawResolution, RecordType,
    RecordTypeSelector, ResolveOptions, WildcardRecords, WildcardStatus, WildcardVerdict,
};
pub use error_handling::{EngineError, InitializationError, QueryError};
pub use ops::{Operation, Request, Response};
