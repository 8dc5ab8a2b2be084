// Shared test helpers for building mock zones and engines.
//
// This module provides common utilities used across multiple test files to reduce duplication.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use dns_recon::{DnsEngine, EngineConfig, MockClient, MockData};

/// Builds mock zone data from `(host, type, values)` triples.
pub fn zone(entries: &[(&str, &str, &[&str])]) -> MockData {
    let mut data = MockData::new();
    for (host, rdtype, values) in entries {
        data.entry(host.to_string())
            .or_insert_with(HashMap::new)
            .insert(
                rdtype.to_string(),
                values.iter().map(|v| v.to_string()).collect(),
            );
    }
    data
}

/// Creates an engine backed by a mock client, returning both.
pub fn mock_engine_with(
    config: EngineConfig,
    entries: &[(&str, &str, &[&str])],
) -> (DnsEngine, Arc<MockClient>) {
    let client = Arc::new(MockClient::new(zone(entries)).expect("mock zone should be valid"));
    (DnsEngine::new(config, client.clone()), client)
}

/// Creates an engine with the default configuration backed by a mock client.
#[allow(dead_code)] // Not every test file needs a default engine
pub fn mock_engine(entries: &[(&str, &str, &[&str])]) -> (DnsEngine, Arc<MockClient>) {
    mock_engine_with(EngineConfig::default(), entries)
}

/// Collects string slices into an ordered set.
pub fn set(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// A zone where every subdomain of github.io answers with the Pages address.
#[allow(dead_code)]
pub const GITHUB_IO: &[(&str, &str, &[&str])] = &[
    ("*.github.io", "A", &["185.199.108.153"]),
    ("github.io", "A", &["185.199.108.153"]),
];
