//! Error type definitions.
//!
//! This module defines the DNS query failure taxonomy, the errors surfaced by
//! engine operations, and initialization errors.

use log::SetLoggerError;
use serde::Serialize;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error reading or parsing the engine configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Error initializing the DNS resolver.
    #[error("DNS resolver initialization error: {0}")]
    DnsResolverError(String),
}

/// Failures reported by a DNS protocol client for a single query.
///
/// The variants drive the retry policy:
/// - `NoNameservers` is permanent for the query (SERVFAIL, REFUSED, no
///   reachable server) and is never retried
/// - `Timeout` is transient and retried while attempts remain
/// - `Protocol` is a soft failure the engine treats as an empty answer
/// - `Unexpected` is logged and swallowed to an empty answer
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail")]
pub enum QueryError {
    /// All nameservers failed to give an answer.
    #[error("All nameservers failed to answer: {0}")]
    NoNameservers(String),

    /// The query timed out.
    #[error("DNS query timed out")]
    Timeout,

    /// Malformed or otherwise unusable response.
    #[error("DNS protocol error: {0}")]
    Protocol(String),

    /// Anything the client did not expect.
    #[error("Unexpected DNS client error: {0}")]
    Unexpected(String),
}

impl QueryError {
    /// Whether the query may succeed if retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, QueryError::Timeout)
    }

    /// Whether the failure ends the retry loop for this query.
    pub fn is_terminal(&self) -> bool {
        matches!(self, QueryError::NoNameservers(_))
    }

    /// Whether the failure counts against the circuit breaker and is reported to the caller.
    pub fn is_counted(&self) -> bool {
        self.is_transient() || self.is_terminal()
    }
}

/// Errors surfaced by the top-level engine operations.
///
/// DNS conditions never show up here; they become empty results plus
/// entries in the error list. These indicate a bad request or a defect.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The query target is empty or unusable.
    #[error("Invalid query: {0:?}")]
    InvalidQuery(String),

    /// The record type is not supported.
    #[error("Invalid record type: {0:?}")]
    InvalidRecordType(String),

    /// Arguments that are inconsistent with each other.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A batch worker panicked or was cancelled.
    #[error("Worker failed: {0}")]
    Worker(String),
}

/// Kinds of events counted by [`super::ResolutionStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum StatKind {
    /// Answer served from the record cache
    CacheHit,
    /// Record cache lookup that found nothing
    CacheMiss,
    /// Query sent to the protocol client
    Query,
    /// Query that timed out
    Timeout,
    /// Query that failed with no usable nameserver
    NoNameservers,
    /// Soft protocol failure
    ProtocolError,
    /// Unexpected client failure
    UnexpectedError,
    /// Query skipped by the circuit breaker
    Aborted,
    /// Query skipped because of `dns_omit_queries`
    Omitted,
    /// Random-subdomain probe issued during wildcard detection
    WildcardProbe,
}

impl std::fmt::Display for StatKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl StatKind {
    /// Returns a human-readable string representation of the stat kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            StatKind::CacheHit => "Cache hit",
            StatKind::CacheMiss => "Cache miss",
            StatKind::Query => "DNS query",
            StatKind::Timeout => "DNS timeout",
            StatKind::NoNameservers => "No nameservers",
            StatKind::ProtocolError => "DNS protocol error",
            StatKind::UnexpectedError => "Unexpected DNS error",
            StatKind::Aborted => "Aborted by circuit breaker",
            StatKind::Omitted => "Omitted by configuration",
            StatKind::WildcardProbe => "Wildcard probe",
        }
    }
}
