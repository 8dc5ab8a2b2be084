//! Deterministic in-memory DNS client.
//!
//! `MockClient` answers from a static table so the engine can be exercised
//! without network access. It supports wildcard entries (`*.example.com`),
//! injected failures and a query counter.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use crate::dns::client::DnsClient;
use crate::dns::types::{DnsRecord, RecordType};
use crate::domain::{clean_dns_record, host_in_host};
use crate::error_handling::{EngineError, QueryError};

/// Mock zone data: `host -> record type -> presentation-format values`.
///
/// Reverse entries are keyed by the address text with a `PTR` type.
pub type MockData = HashMap<String, HashMap<String, Vec<String>>>;

/// In-memory [`DnsClient`].
///
/// # Examples
///
/// ```
/// use dns_recon::{DnsClient, MockClient, RecordType};
/// use std::collections::HashMap;
///
/// # #[tokio::main]
/// # async fn main() {
/// let data = HashMap::from([(
///     "evilcorp.com".to_string(),
///     HashMap::from([("A".to_string(), vec!["1.2.3.4".to_string()])]),
/// )]);
/// let client = MockClient::new(data).unwrap();
/// let records = client.resolve("evilcorp.com", RecordType::A).await.unwrap();
/// assert_eq!(records.len(), 1);
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MockClient {
    records: HashMap<String, HashMap<RecordType, Vec<DnsRecord>>>,
    failures: RwLock<Vec<(String, QueryError)>>,
    queries: AtomicUsize,
}

impl MockClient {
    /// Builds a client from mock zone data.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidRecordType` or `EngineError::InvalidArgument`
    /// if a type or value cannot be parsed.
    pub fn new(data: MockData) -> Result<Self, EngineError> {
        let mut records: HashMap<String, HashMap<RecordType, Vec<DnsRecord>>> = HashMap::new();
        for (host, types) in data {
            let entry = records.entry(clean_dns_record(&host)).or_default();
            for (rdtype, values) in types {
                let rdtype: RecordType = rdtype.parse()?;
                let parsed = values
                    .iter()
                    .map(|v| DnsRecord::parse(rdtype, v))
                    .collect::<Result<Vec<_>, _>>()?;
                entry.entry(rdtype).or_default().extend(parsed);
            }
        }
        Ok(Self {
            records,
            ..Default::default()
        })
    }

    /// Makes every query for `host_suffix` (or a subdomain of it) fail with `error`.
    pub fn fail_with(self, host_suffix: &str, error: QueryError) -> Self {
        self.add_failure(host_suffix, error);
        self
    }

    /// Adds a failure rule to a client that is already shared.
    pub fn add_failure(&self, host_suffix: &str, error: QueryError) {
        self.failures
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((clean_dns_record(host_suffix), error));
    }

    /// Removes all failure rules.
    pub fn clear_failures(&self) {
        self.failures
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of lookups answered so far.
    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    fn injected_failure(&self, name: &str) -> Option<QueryError> {
        self.failures
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|(suffix, _)| host_in_host(name, suffix))
            .map(|(_, error)| error.clone())
    }

    fn lookup(&self, name: &str, rdtype: RecordType) -> Vec<DnsRecord> {
        if let Some(types) = self.records.get(name) {
            return types.get(&rdtype).cloned().unwrap_or_default();
        }
        // Closest enclosing wildcard wins
        let mut rest = name;
        while let Some((_, parent)) = rest.split_once('.') {
            if let Some(types) = self.records.get(&format!("*.{parent}")) {
                return types.get(&rdtype).cloned().unwrap_or_default();
            }
            rest = parent;
        }
        Vec::new()
    }
}

#[async_trait]
impl DnsClient for MockClient {
    async fn resolve(&self, name: &str, rdtype: RecordType) -> Result<Vec<DnsRecord>, QueryError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        let name = clean_dns_record(name);
        if let Some(error) = self.injected_failure(&name) {
            return Err(error);
        }
        Ok(self.lookup(&name, rdtype))
    }

    async fn resolve_address(&self, ip: IpAddr) -> Result<Vec<DnsRecord>, QueryError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        let key = ip.to_string();
        if let Some(error) = self.injected_failure(&key) {
            return Err(error);
        }
        Ok(self
            .records
            .get(&key)
            .and_then(|types| types.get(&RecordType::PTR))
            .cloned()
            .unwrap_or_default())
    }
}
