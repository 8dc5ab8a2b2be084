//! Circuit breaker for failing DNS parents.
//!
//! Counts timeouts and nameserver failures per `parent:TYPE` key. Once a key
//! reaches the abort threshold, further queries under that parent are skipped
//! unless a connectivity probe shows the network itself was at fault.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::dns::client::DnsClient;
use crate::dns::types::RecordType;

/// Per-parent failure counters plus connectivity state.
pub struct ErrorTracker {
    /// Failure count at which queries are aborted
    abort_threshold: u32,
    /// Current failure count per key
    counts: Mutex<HashMap<u64, u32>>,
    /// Keys whose abort has already been logged
    warned: Mutex<HashSet<u64>>,
    /// Time of the last successful resolution
    last_success: Mutex<Option<Instant>>,
    /// Time of the last connectivity warning, starting at creation
    last_warning: Mutex<Option<Instant>>,
    /// Serializes connectivity probes
    probe_lock: tokio::sync::Mutex<()>,
}

impl ErrorTracker {
    /// Creates a tracker that aborts after `abort_threshold` failures.
    pub fn new(abort_threshold: u32) -> Self {
        ErrorTracker {
            abort_threshold,
            counts: Mutex::new(HashMap::new()),
            warned: Mutex::new(HashSet::new()),
            last_success: Mutex::new(None),
            last_warning: Mutex::new(Some(Instant::now())),
            probe_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Counter key for failures of `rdtype` queries below `parent`.
    pub fn error_key(parent: &str, rdtype: RecordType) -> u64 {
        super::cache::cache_key(parent, rdtype)
    }

    /// Records a failure and returns the new count.
    pub fn record_failure(&self, key: u64) -> u32 {
        let mut counts = self.counts.lock().unwrap_or_else(PoisonError::into_inner);
        let count = counts.entry(key).or_insert(0);
        *count = count.saturating_add(1);
        *count
    }

    /// Resets the counter for `key` and marks a successful resolution.
    pub fn record_success(&self, key: u64) {
        if let Some(count) = self
            .counts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(&key)
        {
            *count = 0;
        }
        self.mark_success();
    }

    /// Current failure count for `key`.
    pub fn error_count(&self, key: u64) -> u32 {
        self.counts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .copied()
            .unwrap_or(0)
    }

    /// Whether `key` has reached the abort threshold.
    pub fn should_abort(&self, key: u64) -> bool {
        self.error_count(key) >= self.abort_threshold
    }

    /// The configured abort threshold.
    pub fn abort_threshold(&self) -> u32 {
        self.abort_threshold
    }

    /// Returns `true` the first time an abort is reported for `key`.
    pub fn first_abort(&self, key: u64) -> bool {
        self.warned
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key)
    }

    /// Records that some resolution succeeded just now.
    pub fn mark_success(&self) {
        *self
            .last_success
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(Instant::now());
    }

    /// Whether a resolution succeeded within `interval`.
    pub fn succeeded_within(&self, interval: Duration) -> bool {
        self.last_success
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some_and(|t| t.elapsed() < interval)
    }

    /// Clears every counter and the abort warnings.
    pub fn clear(&self) {
        self.counts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.warned
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Checks whether DNS works at all.
    ///
    /// A success within `interval` counts as connectivity without probing.
    /// Otherwise one caller at a time resolves `probe_name`. A successful
    /// probe clears every counter; a failed one logs a rate-limited warning
    /// and leaves the counters alone.
    pub async fn connectivity_check(
        &self,
        client: &dyn DnsClient,
        probe_name: &str,
        interval: Duration,
        timeout: Duration,
    ) -> bool {
        if self.succeeded_within(interval) {
            return true;
        }
        {
            let _guard = self.probe_lock.lock().await;
            // Another caller may have probed while we waited
            if self.succeeded_within(interval) {
                return true;
            }
            let probe = tokio::time::timeout(timeout, client.resolve(probe_name, RecordType::A));
            if let Ok(Ok(records)) = probe.await {
                if !records.is_empty() {
                    self.mark_success();
                    self.clear();
                    return true;
                }
            }
        }
        self.warn_connectivity(interval);
        false
    }

    /// Logs a connectivity warning at most once per `interval`. Returns whether it logged.
    fn warn_connectivity(&self, interval: Duration) -> bool {
        let mut last = self
            .last_warning
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if last.map_or(true, |t| t.elapsed() >= interval) {
            log::warn!("DNS queries are failing, please check your internet connection");
            *last = Some(Instant::now());
            return true;
        }
        false
    }
}
