//! Record and wildcard caches.
//!
//! - `RecordCache`: bounded LRU of raw answers keyed by `target:TYPE`
//! - `WildcardCache`: per-host wildcard probe results, written once per host
//!
//! Neither cache expires entries; `clear()` is the only invalidation.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::sync::{Mutex, PoisonError, RwLock};

use lru::LruCache;

use crate::config::RECORD_CACHE_CAPACITY;
use crate::dns::types::{DnsRecord, RecordType, WildcardRecords};

fn hash_str(s: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    s.hash(&mut hasher);
    hasher.finish()
}

/// Cache key for a `(target, record type)` query.
pub fn cache_key(target: &str, rdtype: RecordType) -> u64 {
    hash_str(&format!("{target}:{rdtype}"))
}

/// Cache key for a host, used by the wildcard cache and host locks.
pub fn host_key(host: &str) -> u64 {
    hash_str(host)
}

/// Bounded LRU cache of raw answers.
pub struct RecordCache {
    cache: Mutex<LruCache<u64, Vec<DnsRecord>>>,
}

impl RecordCache {
    /// Creates a cache holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity)
            .or(NonZeroUsize::new(RECORD_CACHE_CAPACITY))
            .unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LruCache<u64, Vec<DnsRecord>>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the cached answer and marks it most recently used.
    pub fn get(&self, key: u64) -> Option<Vec<DnsRecord>> {
        self.lock().get(&key).cloned()
    }

    /// Stores an answer, evicting the least recently used entry when full.
    pub fn put(&self, key: u64, records: Vec<DnsRecord>) {
        self.lock().put(key, records);
    }

    /// Whether `key` is cached. Does not touch recency.
    pub fn contains(&self, key: u64) -> bool {
        self.lock().contains(&key)
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.lock().cap().get()
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.lock().clear();
    }
}

/// Wildcard probe results per host.
///
/// A present key means the host has been probed; an empty map means it is
/// not a wildcard for any probed type.
#[derive(Default)]
pub struct WildcardCache {
    entries: RwLock<HashMap<u64, WildcardRecords>>,
}

impl WildcardCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Probe results for `key`, if probed.
    pub fn get(&self, key: u64) -> Option<WildcardRecords> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned()
    }

    /// Records probe results for `key`.
    pub fn insert(&self, key: u64, records: WildcardRecords) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, records);
    }

    /// Whether `key` has been probed.
    pub fn contains(&self, key: u64) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&key)
    }

    /// Number of probed hosts.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no host has been probed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forgets every probed host.
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn a(ip: &str) -> Vec<DnsRecord> {
        vec![DnsRecord::A {
            address: ip.parse().unwrap(),
        }]
    }

    #[test]
    fn test_cache_keys_distinguish_type() {
        assert_eq!(
            cache_key("one.one.one.one", RecordType::A),
            cache_key("one.one.one.one", RecordType::A)
        );
        assert_ne!(
            cache_key("one.one.one.one", RecordType::A),
            cache_key("one.one.one.one", RecordType::AAAA)
        );
        assert_eq!(host_key("github.io"), host_key("github.io"));
    }

    #[test]
    fn test_record_cache_lru_eviction() {
        let cache = RecordCache::new(2);
        cache.put(1, a("1.1.1.1"));
        cache.put(2, a("2.2.2.2"));
        // Touch 1 so 2 becomes least recently used
        assert!(cache.get(1).is_some());
        cache.put(3, a("3.3.3.3"));
        assert_eq!(cache.len(), 2);
        assert!(cache.contains(1));
        assert!(!cache.contains(2));
        assert!(cache.contains(3));
    }

    #[test]
    fn test_record_cache_zero_capacity_uses_default() {
        let cache = RecordCache::new(0);
        assert_eq!(cache.capacity(), RECORD_CACHE_CAPACITY);
    }

    #[test]
    fn test_record_cache_clear() {
        let cache = RecordCache::new(10);
        cache.put(1, a("1.1.1.1"));
        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get(1).is_none());
    }

    #[test]
    fn test_wildcard_cache() {
        let cache = WildcardCache::new();
        let key = host_key("github.io");
        assert!(!cache.contains(key));
        let mut records = WildcardRecords::new();
        records.insert(RecordType::A, BTreeSet::from(["185.199.108.153".to_string()]));
        cache.insert(key, records.clone());
        assert_eq!(cache.get(key), Some(records));
        cache.insert(host_key("example.com"), WildcardRecords::new());
        assert_eq!(cache.len(), 2);
        cache.clear();
        assert!(cache.is_empty());
    }
}
