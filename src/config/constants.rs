//! Configuration constants.
//!
//! This module defines the defaults used by the resolution engine, including
//! timeouts, retry counts, cache sizes and wildcard probing parameters.

use std::time::Duration;

use crate::dns::RecordType;

// Network operation timeouts
/// Per-query DNS timeout in seconds
pub const DEFAULT_DNS_TIMEOUT_SECS: f64 = 5.0;
/// Additional attempts after the first failed query
pub const DEFAULT_DNS_RETRIES: u32 = 1;
/// Failed queries per parent domain and record type before queries are aborted
pub const DEFAULT_DNS_ABORT_THRESHOLD: u32 = 50;
/// Maximum distance of DNS children from the original target (enforced by callers)
pub const DEFAULT_MAX_DNS_RESOLVE_DISTANCE: u32 = 5;

// Wildcard detection
/// Random subdomains queried per record type when probing a host for wildcard DNS
pub const DEFAULT_DNS_WILDCARD_TESTS: usize = 5;
/// Length of the random label used for wildcard probes
pub const WILDCARD_LABEL_LENGTH: usize = 10;

// Batch resolution
/// Maximum number of in-flight queries in a batch
pub const DEFAULT_BATCH_CONCURRENCY: usize = 10;

// Caching
/// Maximum number of cached raw answers (least recently used entries are evicted)
pub const RECORD_CACHE_CAPACITY: usize = 10_000;

// Connectivity check
/// A successful query within this window means the network is assumed to be up
pub const CONNECTIVITY_INTERVAL: Duration = Duration::from_secs(5);
/// Well-known name resolved to test whether DNS works at all
pub const CONNECTIVITY_CHECK_NAME: &str = "www.google.com";

/// Record types queried when "all" record types are requested.
///
/// PTR and NSEC are never part of this set: PTR is only used for reverse
/// lookups and NSEC only when explicitly requested.
pub const ALL_RECORD_TYPES: [RecordType; 8] = [
    RecordType::A,
    RecordType::AAAA,
    RecordType::SRV,
    RecordType::MX,
    RecordType::NS,
    RecordType::SOA,
    RecordType::CNAME,
    RecordType::TXT,
];
