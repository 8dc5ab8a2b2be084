//! DNS resolution engine.
//!
//! This module provides async DNS resolution on top of a pluggable protocol
//! client (`hickory-resolver` in production, an in-memory mock in tests):
//! - Forward and reverse lookups with an LRU record cache and retries
//! - A per-parent circuit breaker with a connectivity probe
//! - Bounded-concurrency batch resolution
//! - Wildcard DNS detection and event reconciliation
//!
//! All shared state lives in [`DnsEngine`]; clones of an engine share it.

mod batch;
mod cache;
mod circuit_breaker;
mod client;
mod engine;
mod event;
mod extract;
mod mock;
mod reconcile;
mod resolution;
mod types;
mod wildcard;

// Re-export public API
pub use batch::BatchRunner;
pub use cache::{cache_key, host_key, RecordCache, WildcardCache};
pub use circuit_breaker::ErrorTracker;
pub use client::{DnsClient, HickoryClient};
pub use engine::DnsEngine;
pub use event::{EventKind, EventResolution};
pub use extract::extract_targets;
pub use mock::{MockClient, MockData};
pub use reconcile::{EventRef, WildcardVerdict, WILDCARD_LABEL};
pub use resolution::ResolveOptions;
pub use types::{
    DnsRecord, ExtractedResolution, Query, RawResolution, RecordType, RecordTypeSelector,
    WildcardRecords,
};
pub use wildcard::WildcardStatus;

#[cfg(test)]
mod tests {
    include!("tests.rs");
}
