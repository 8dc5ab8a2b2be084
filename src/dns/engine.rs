//! The resolution engine context.
//!
//! `DnsEngine` owns every piece of shared state: the protocol client, the
//! record and wildcard caches, the circuit breaker, host locks and the
//! statistics. It is cheap to clone; clones share the same state.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::config::{EngineConfig, OmitQueries};
use crate::dns::cache::{RecordCache, WildcardCache};
use crate::dns::circuit_breaker::ErrorTracker;
use crate::dns::client::{DnsClient, HickoryClient};
use crate::dns::mock::{MockClient, MockData};
use crate::error_handling::{EngineError, InitializationError, ResolutionStats};

/// Per-query diagnostics, emitted at trace level only when `dns_debug` is set.
macro_rules! dns_debug {
    ($engine:expr, $($arg:tt)+) => {
        if $engine.config().dns_debug {
            log::trace!($($arg)+);
        }
    };
}
pub(crate) use dns_debug;

/// Lazily created per-host mutexes serializing wildcard probes.
#[derive(Default)]
pub(crate) struct HostLocks {
    locks: Mutex<HashMap<u64, Arc<tokio::sync::Mutex<()>>>>,
}

impl HostLocks {
    /// Lock handle for `key`, created on first use.
    pub(crate) fn handle(&self, key: u64) -> Arc<tokio::sync::Mutex<()>> {
        Arc::clone(
            self.locks
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .entry(key)
                .or_default(),
        )
    }

    /// Drops the table entry for `key` once no other caller holds or waits on it.
    pub(crate) fn release(&self, key: u64, handle: Arc<tokio::sync::Mutex<()>>) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // One reference in the table, one held by the caller
        if Arc::strong_count(&handle) <= 2 {
            locks.remove(&key);
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

struct EngineState {
    config: EngineConfig,
    omit_queries: OmitQueries,
    wildcard_ignore: Vec<String>,
    client: RwLock<Arc<dyn DnsClient>>,
    record_cache: RecordCache,
    wildcard_cache: WildcardCache,
    tracker: ErrorTracker,
    host_locks: HostLocks,
    stats: ResolutionStats,
}

/// DNS resolution engine with caching, circuit breaking and wildcard detection.
///
/// # Examples
///
/// ```
/// use dns_recon::{DnsEngine, EngineConfig, MockClient};
/// use std::collections::HashMap;
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() {
/// let data = HashMap::from([(
///     "one.one.one.one".to_string(),
///     HashMap::from([("A".to_string(), vec!["1.1.1.1".to_string()])]),
/// )]);
/// let engine = DnsEngine::new(EngineConfig::default(), Arc::new(MockClient::new(data).unwrap()));
/// let ips = engine.resolve("one.one.one.one", Default::default()).await.unwrap();
/// assert!(ips.contains("1.1.1.1"));
/// # }
/// ```
#[derive(Clone)]
pub struct DnsEngine {
    state: Arc<EngineState>,
}

impl DnsEngine {
    /// Creates an engine that queries through `client`.
    pub fn new(config: EngineConfig, client: Arc<dyn DnsClient>) -> Self {
        let omit_queries = config.omit_queries();
        let wildcard_ignore = config.wildcard_ignore();
        let state = EngineState {
            record_cache: RecordCache::new(config.dns_cache_size),
            wildcard_cache: WildcardCache::new(),
            tracker: ErrorTracker::new(config.dns_abort_threshold),
            host_locks: HostLocks::default(),
            stats: ResolutionStats::new(),
            client: RwLock::new(client),
            omit_queries,
            wildcard_ignore,
            config,
        };
        DnsEngine {
            state: Arc::new(state),
        }
    }

    /// Creates an engine backed by the system resolver configuration.
    ///
    /// # Errors
    ///
    /// Returns `InitializationError::DnsResolverError` if the resolver cannot be built.
    pub fn with_resolver(config: EngineConfig) -> Result<Self, InitializationError> {
        let resolver = crate::initialization::init_resolver(&config)?;
        Ok(Self::new(config, Arc::new(HickoryClient::new(resolver))))
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.state.config
    }

    pub(crate) fn omit_queries(&self) -> &OmitQueries {
        &self.state.omit_queries
    }

    pub(crate) fn wildcard_ignore(&self) -> &[String] {
        &self.state.wildcard_ignore
    }

    /// The active protocol client.
    pub fn client(&self) -> Arc<dyn DnsClient> {
        Arc::clone(
            &self
                .state
                .client
                .read()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }

    /// Replaces the protocol client. In-flight queries finish on the old one.
    pub fn set_client(&self, client: Arc<dyn DnsClient>) {
        *self
            .state
            .client
            .write()
            .unwrap_or_else(PoisonError::into_inner) = client;
    }

    /// Swaps in a [`MockClient`] built from `data` and returns it.
    ///
    /// # Errors
    ///
    /// Returns an error if the mock data contains an unknown type or an
    /// unparsable value.
    pub fn inject_mock_resolver(&self, data: MockData) -> Result<Arc<MockClient>, EngineError> {
        let mock = Arc::new(MockClient::new(data)?);
        self.set_client(mock.clone());
        log::debug!("Injected mock DNS resolver");
        Ok(mock)
    }

    /// Raw answer cache.
    pub fn record_cache(&self) -> &RecordCache {
        &self.state.record_cache
    }

    /// Wildcard probe cache.
    pub fn wildcard_cache(&self) -> &WildcardCache {
        &self.state.wildcard_cache
    }

    /// Circuit breaker state.
    pub fn error_tracker(&self) -> &ErrorTracker {
        &self.state.tracker
    }

    pub(crate) fn host_locks(&self) -> &HostLocks {
        &self.state.host_locks
    }

    /// Resolution counters.
    pub fn stats(&self) -> &ResolutionStats {
        &self.state.stats
    }

    /// Clears the record cache, the wildcard cache and the error counters.
    pub fn clear_caches(&self) {
        self.state.record_cache.clear();
        self.state.wildcard_cache.clear();
        self.state.tracker.clear();
    }

    /// Logs the non-zero resolution counters.
    pub fn log_stats(&self) {
        for (kind, count) in self.stats().snapshot() {
            log::info!("{kind}: {count}");
        }
    }
}
