//! Engine operations and request dispatch.
//!
//! A transport (stdin, a socket, a job queue) hands the engine a [`Request`]
//! and gets back a [`Response`]. Every operation has a stable name and a
//! numeric code; both map onto a closed [`Operation`] enum, and
//! [`DnsEngine::dispatch`] binds each variant to its handler.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use futures::StreamExt;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

use crate::dns::{
    DnsEngine, EventKind, EventResolution, ExtractedResolution, MockData, Query, RecordType,
    RecordTypeSelector, ResolveOptions, WildcardRecords, WildcardStatus,
};
use crate::error_handling::EngineError;

/// Operations the engine exposes to a transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum Operation {
    /// Resolve one host or address
    Resolve,
    /// Resolve and tag an event host
    ResolveEvent,
    /// Resolve many hosts concurrently
    ResolveBatch,
    /// Resolve many `(target, type)` pairs and extract their targets
    ResolveRawBatch,
    /// Check whether a name is a wildcard entry
    IsWildcard,
    /// Check whether a domain serves wildcard DNS
    IsWildcardDomain,
    /// Replace the protocol client with a mock (tests only)
    InjectMockResolver,
}

impl Operation {
    /// Numeric code used by compact transports.
    pub fn code(&self) -> u8 {
        match self {
            Operation::Resolve => 0,
            Operation::ResolveEvent => 1,
            Operation::ResolveBatch => 2,
            Operation::ResolveRawBatch => 3,
            Operation::IsWildcard => 4,
            Operation::IsWildcardDomain => 5,
            Operation::InjectMockResolver => 99,
        }
    }

    /// Stable operation name.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Resolve => "resolve",
            Operation::ResolveEvent => "resolve_event",
            Operation::ResolveBatch => "resolve_batch",
            Operation::ResolveRawBatch => "resolve_raw_batch",
            Operation::IsWildcard => "is_wildcard",
            Operation::IsWildcardDomain => "is_wildcard_domain",
            Operation::InjectMockResolver => "inject_mock_resolver",
        }
    }

    /// Operation for a numeric code.
    pub fn from_code(code: u8) -> Option<Self> {
        Operation::iter().find(|op| op.code() == code)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::iter()
            .find(|op| op.name() == s)
            .ok_or_else(|| EngineError::InvalidArgument(format!("unknown operation {s:?}")))
    }
}

fn default_use_cache() -> bool {
    true
}

/// An operation together with its arguments.
///
/// Serialized as `{"command": "<name>", "args": {...}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "command", content = "args", rename_all = "snake_case")]
pub enum Request {
    /// See [`DnsEngine::resolve`]
    Resolve {
        /// Hostname or IP address
        query: String,
        /// Record type, `any`/`all`/`*`, or nothing for the default
        #[serde(default)]
        rdtype: Option<String>,
        /// Read from and write to the record cache
        #[serde(default = "default_use_cache")]
        use_cache: bool,
    },
    /// See [`DnsEngine::resolve_event`]
    ResolveEvent {
        /// Host of the event
        host: String,
        /// Event kind
        #[serde(default)]
        kind: EventKind,
        /// Only resolve A/AAAA
        #[serde(default)]
        minimal: bool,
    },
    /// See [`DnsEngine::resolve_batch`]
    ResolveBatch {
        /// Hostnames or IP addresses
        queries: Vec<String>,
        /// Record type for every query
        #[serde(default)]
        rdtype: Option<String>,
    },
    /// See [`DnsEngine::resolve_raw_batch`]
    ResolveRawBatch {
        /// `(target, type)` pairs
        queries: Vec<Query>,
    },
    /// See [`DnsEngine::is_wildcard`]
    IsWildcard {
        /// Name to check
        query: String,
        /// Already resolved values for `rdtype`
        #[serde(default)]
        ips: Option<Vec<String>>,
        /// Record type of `ips`, or the only type to check
        #[serde(default)]
        rdtype: Option<RecordType>,
    },
    /// See [`DnsEngine::is_wildcard_domain`]
    IsWildcardDomain {
        /// Domain to probe
        domain: String,
        /// Log discoveries at info level
        #[serde(default)]
        log_info: bool,
    },
    /// See [`DnsEngine::inject_mock_resolver`]
    InjectMockResolver {
        /// Mock zone data
        data: MockData,
    },
}

impl Request {
    /// The operation this request invokes.
    pub fn operation(&self) -> Operation {
        match self {
            Request::Resolve { .. } => Operation::Resolve,
            Request::ResolveEvent { .. } => Operation::ResolveEvent,
            Request::ResolveBatch { .. } => Operation::ResolveBatch,
            Request::ResolveRawBatch { .. } => Operation::ResolveRawBatch,
            Request::IsWildcard { .. } => Operation::IsWildcard,
            Request::IsWildcardDomain { .. } => Operation::IsWildcardDomain,
            Request::InjectMockResolver { .. } => Operation::InjectMockResolver,
        }
    }

    /// Builds a request from a numeric operation code and JSON arguments.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidArgument` for an unknown code or arguments
    /// that do not fit the operation.
    pub fn from_code(code: u8, args: serde_json::Value) -> Result<Self, EngineError> {
        let operation = Operation::from_code(code)
            .ok_or_else(|| EngineError::InvalidArgument(format!("unknown operation code {code}")))?;
        let raw = serde_json::json!({ "command": operation.name(), "args": args });
        serde_json::from_value(raw)
            .map_err(|e| EngineError::InvalidArgument(format!("{operation}: {e}")))
    }
}

/// Result of a dispatched operation.
///
/// Serialized as `{"kind": "<variant>", "result": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "result", rename_all = "snake_case")]
pub enum Response {
    /// Extracted values of one resolution
    Resolved(BTreeSet<String>),
    /// Tags and children of an event host
    Event(EventResolution),
    /// `(query, values)` pairs, sorted by query
    Batch(Vec<(String, BTreeSet<String>)>),
    /// `(query, extracted)` pairs, sorted by query
    RawBatch(Vec<(Query, ExtractedResolution)>),
    /// Wildcard verdict per record type
    Wildcard(BTreeMap<RecordType, WildcardStatus>),
    /// Wildcard records per examined host
    WildcardDomain(BTreeMap<String, WildcardRecords>),
    /// Operation without a result
    Done,
}

fn parse_selector(rdtype: Option<&str>) -> Result<RecordTypeSelector, EngineError> {
    rdtype.map_or(Ok(RecordTypeSelector::Default), str::parse)
}

impl DnsEngine {
    /// Runs a request and returns its response.
    ///
    /// Batch operations are collected in full and sorted by query.
    ///
    /// # Errors
    ///
    /// Returns the `EngineError` of the invoked operation, or
    /// `EngineError::InvalidRecordType` for an unknown record type argument.
    pub async fn dispatch(&self, request: Request) -> Result<Response, EngineError> {
        let operation = request.operation();
        log::debug!("Dispatching {operation} (code {})", operation.code());
        let response = match request {
            Request::Resolve {
                query,
                rdtype,
                use_cache,
            } => {
                let selector = parse_selector(rdtype.as_deref())?;
                let options = if use_cache {
                    ResolveOptions::default()
                } else {
                    ResolveOptions::no_cache()
                };
                Response::Resolved(self.resolve_with(&query, selector, options).await?)
            }
            Request::ResolveEvent {
                host,
                kind,
                minimal,
            } => Response::Event(self.resolve_event(&host, kind, minimal).await),
            Request::ResolveBatch { queries, rdtype } => {
                let selector = parse_selector(rdtype.as_deref())?;
                let mut results: Vec<_> = self.resolve_batch(queries, selector).collect().await;
                results.sort();
                Response::Batch(results)
            }
            Request::ResolveRawBatch { queries } => {
                let mut results: Vec<_> = self.resolve_raw_batch(queries).collect().await;
                results.sort_by(|(a, _), (b, _)| {
                    (a.target.as_str(), a.rdtype).cmp(&(b.target.as_str(), b.rdtype))
                });
                Response::RawBatch(results)
            }
            Request::IsWildcard { query, ips, rdtype } => {
                Response::Wildcard(self.is_wildcard(&query, ips.as_deref(), rdtype).await?)
            }
            Request::IsWildcardDomain { domain, log_info } => {
                Response::WildcardDomain(self.is_wildcard_domain(&domain, log_info).await)
            }
            Request::InjectMockResolver { data } => {
                self.inject_mock_resolver(data)?;
                Response::Done
            }
        };
        Ok(response)
    }
}
