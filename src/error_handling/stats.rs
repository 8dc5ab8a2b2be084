//! Resolution statistics tracking.
//!
//! This module provides thread-safe counters for cache behaviour, queries and
//! failures observed by the resolution engine.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use strum::IntoEnumIterator;

use super::types::StatKind;

/// Thread-safe resolution statistics tracker.
///
/// Every [`StatKind`] is initialized to zero on creation, so lookups never
/// miss. Shared across tasks behind an `Arc`.
pub struct ResolutionStats {
    counters: HashMap<StatKind, AtomicUsize>,
}

impl ResolutionStats {
    pub fn new() -> Self {
        let mut counters = HashMap::new();
        for kind in StatKind::iter() {
            counters.insert(kind, AtomicUsize::new(0));
        }
        ResolutionStats { counters }
    }

    /// Increment a counter.
    pub fn increment(&self, kind: StatKind) {
        self.add(kind, 1);
    }

    /// Add `n` to a counter.
    pub fn add(&self, kind: StatKind, n: usize) {
        if let Some(counter) = self.counters.get(&kind) {
            counter.fetch_add(n, Ordering::Relaxed);
        } else {
            log::error!(
                "Attempted to increment counter for {:?} which is not in the map. \
                 This indicates a bug in ResolutionStats initialization.",
                kind
            );
        }
    }

    /// Get the count for a kind.
    pub fn get(&self, kind: StatKind) -> usize {
        self.counters
            .get(&kind)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    /// Total number of failed queries of any kind.
    pub fn total_failures(&self) -> usize {
        [
            StatKind::Timeout,
            StatKind::NoNameservers,
            StatKind::ProtocolError,
            StatKind::UnexpectedError,
        ]
        .into_iter()
        .map(|k| self.get(k))
        .sum()
    }

    /// Snapshot of every non-zero counter, for logging.
    pub fn snapshot(&self) -> Vec<(StatKind, usize)> {
        StatKind::iter()
            .map(|k| (k, self.get(k)))
            .filter(|(_, v)| *v > 0)
            .collect()
    }

    /// Resets every counter to zero.
    pub fn reset(&self) {
        for counter in self.counters.values() {
            counter.store(0, Ordering::SeqCst);
        }
    }
}

impl Default for ResolutionStats {
    fn default() -> Self {
        Self::new()
    }
}
