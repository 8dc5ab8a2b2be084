//! Single-query resolution with caching, retries and circuit breaking.
//!
//! Forward lookups go through the omit list, the record cache and the
//! circuit breaker before reaching the protocol client. Reverse lookups share
//! the cache and retry shape but skip the breaker.

use std::collections::BTreeSet;
use std::future::Future;
use std::net::IpAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, PoisonError};

use tokio_retry::RetryIf;

use crate::dns::cache::cache_key;
use crate::dns::circuit_breaker::ErrorTracker;
use crate::dns::engine::{dns_debug, DnsEngine};
use crate::dns::extract::extract_targets;
use crate::dns::types::{DnsRecord, RawResolution, RecordType, RecordTypeSelector};
use crate::domain::{clean_dns_record, parent_domain, parse_ip};
use crate::error_handling::{
    get_retry_strategy, should_retry, update_error_stats, EngineError, QueryError, StatKind,
};

/// Per-call resolution options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Read from and write to the record cache
    pub use_cache: bool,
    /// Retry override; `None` uses `dns_retries` (forward) or zero (reverse)
    pub retries: Option<u32>,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            use_cache: true,
            retries: None,
        }
    }
}

impl ResolveOptions {
    /// Options that bypass the record cache.
    pub fn no_cache() -> Self {
        Self {
            use_cache: false,
            ..Default::default()
        }
    }
}

/// Result of a single attempt that did not fail with a counted error.
enum Outcome {
    Answered(Vec<DnsRecord>),
    /// Aborted by the breaker or swallowed as a soft failure
    Skipped,
}

/// Outcome of one attempt loop, before it is folded into a `RawResolution`.
struct Attempts {
    records: Vec<DnsRecord>,
    errors: Vec<QueryError>,
}

impl DnsEngine {
    /// Resolves `query` and returns the extracted target values.
    ///
    /// IP addresses are reverse-resolved; hostnames are resolved for the
    /// selected types (A by default).
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidQuery` for an empty query.
    pub async fn resolve(
        &self,
        query: &str,
        selector: RecordTypeSelector,
    ) -> Result<BTreeSet<String>, EngineError> {
        self.resolve_with(query, selector, ResolveOptions::default())
            .await
    }

    /// [`DnsEngine::resolve`] with explicit options.
    pub async fn resolve_with(
        &self,
        query: &str,
        selector: RecordTypeSelector,
        options: ResolveOptions,
    ) -> Result<BTreeSet<String>, EngineError> {
        let raw = self.resolve_raw(query, selector, options).await?;
        Ok(raw
            .records()
            .flat_map(extract_targets)
            .map(|(_, value)| value)
            .collect())
    }

    /// Resolves `query` to raw records plus the counted failures.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidQuery` for an empty query. DNS failures
    /// never surface here; they end up in `RawResolution::errors`.
    pub async fn resolve_raw(
        &self,
        query: &str,
        selector: RecordTypeSelector,
        options: ResolveOptions,
    ) -> Result<RawResolution, EngineError> {
        let query = query.trim();
        if query.is_empty() {
            let err = EngineError::InvalidQuery(query.to_string());
            log::debug!("resolve_raw failed: {err}");
            return Err(err);
        }
        if let Some(ip) = parse_ip(query) {
            return Ok(self.resolve_address(ip, options).await);
        }
        let mut resolution = RawResolution::default();
        for rdtype in selector.types() {
            resolution.extend(self.resolve_hostname(query, rdtype, options).await);
        }
        Ok(resolution)
    }

    /// Forward lookup of one hostname for one record type.
    pub async fn resolve_hostname(
        &self,
        query: &str,
        rdtype: RecordType,
        options: ResolveOptions,
    ) -> RawResolution {
        let query = clean_dns_record(query);
        let mut resolution = RawResolution::default();
        dns_debug!(self, "Resolving {rdtype}:{query} with {options:?}");

        if self.omit_queries().is_omitted(rdtype, &query) {
            dns_debug!(self, "Skipping {rdtype}:{query} because it's omitted in the config");
            self.stats().increment(StatKind::Omitted);
            return resolution;
        }

        let parent = parent_domain(&query);
        let error_key = ErrorTracker::error_key(&parent, rdtype);
        let retries = options.retries.unwrap_or(self.config().dns_retries);
        let key = cache_key(&query, rdtype);

        let client = self.client();
        let breaker = Some((parent.as_str(), error_key));
        let attempts = self
            .attempt(&query, rdtype, key, retries, options.use_cache, breaker, || {
                client.resolve(&query, rdtype)
            })
            .await;
        resolution
            .errors
            .extend(attempts.errors.into_iter().map(|e| (rdtype, e)));
        if !attempts.records.is_empty() {
            dns_debug!(self, "Answers for {rdtype}:{query}: {:?}", attempts.records);
            resolution.answers.push((rdtype, attempts.records));
        }
        resolution
    }

    /// Reverse (PTR) lookup of an address. Retries default to zero.
    pub async fn resolve_address(&self, ip: IpAddr, options: ResolveOptions) -> RawResolution {
        let query = ip.to_string();
        let mut resolution = RawResolution::default();
        dns_debug!(self, "Reverse-resolving {query} with {options:?}");

        let key = cache_key(&query, RecordType::PTR);
        let retries = options.retries.unwrap_or(0);
        let client = self.client();
        let attempts = self
            .attempt(&query, RecordType::PTR, key, retries, options.use_cache, None, || {
                client.resolve_address(ip)
            })
            .await;
        resolution.errors.extend(
            attempts
                .errors
                .into_iter()
                .map(|e| (RecordType::PTR, e)),
        );
        if !attempts.records.is_empty() {
            resolution.answers.push((RecordType::PTR, attempts.records));
        }
        resolution
    }

    /// Checks connectivity the way the circuit breaker does.
    pub async fn connectivity_check(&self) -> bool {
        let client = self.client();
        self.error_tracker()
            .connectivity_check(
                client.as_ref(),
                &self.config().dns_connectivity_check_name,
                self.config().connectivity_interval(),
                self.config().timeout(),
            )
            .await
    }

    /// Decides whether a query below a failing parent is skipped.
    ///
    /// Skips when DNS works elsewhere or is down altogether. A successful
    /// connectivity probe clears the counters and lets the query through.
    async fn breaker_trips(
        &self,
        query: &str,
        parent: &str,
        rdtype: RecordType,
        error_key: u64,
    ) -> bool {
        let online = self.connectivity_check().await;
        let tracker = self.error_tracker();
        if online && !tracker.should_abort(error_key) {
            return false;
        }
        self.stats().increment(StatKind::Aborted);
        let count = tracker.error_count(error_key);
        let threshold = tracker.abort_threshold();
        log::debug!(
            "Aborting query \"{query}\" because failed {rdtype} queries for \"{parent}\" ({count}) exceeded abort threshold ({threshold})"
        );
        if tracker.first_abort(error_key) {
            log::info!(
                "Aborting future {rdtype} queries to \"{parent}\" because error count ({count}) exceeded abort threshold ({threshold})"
            );
        }
        true
    }

    /// Runs the cache lookup and retried query shared by forward and reverse lookups.
    ///
    /// Only transient failures are retried, immediately and at most
    /// `retries` times. The breaker is consulted before every attempt.
    #[allow(clippy::too_many_arguments)]
    async fn attempt<F, Fut>(
        &self,
        query: &str,
        rdtype: RecordType,
        key: u64,
        retries: u32,
        use_cache: bool,
        breaker: Option<(&str, u64)>,
        mut send: F,
    ) -> Attempts
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Vec<DnsRecord>, QueryError>>,
    {
        if use_cache {
            match self.record_cache().get(key) {
                Some(cached) if !cached.is_empty() => {
                    self.stats().increment(StatKind::CacheHit);
                    return Attempts {
                        records: cached,
                        errors: Vec::new(),
                    };
                }
                _ => self.stats().increment(StatKind::CacheMiss),
            }
        }

        let timeout = self.config().timeout();
        let max_attempts = retries.saturating_add(1);
        let failed = AtomicU32::new(0);
        let collected = Mutex::new(Vec::new());
        let (failed_ref, collected_ref) = (&failed, &collected);

        let action = || {
            let request = send();
            async move {
                if let Some((parent, error_key)) = breaker {
                    if self.error_tracker().should_abort(error_key)
                        && self.breaker_trips(query, parent, rdtype, error_key).await
                    {
                        return Ok(Outcome::Skipped);
                    }
                }
                self.stats().increment(StatKind::Query);
                let outcome = tokio::time::timeout(timeout, request)
                    .await
                    .unwrap_or(Err(QueryError::Timeout));
                match outcome {
                    Ok(records) => {
                        if use_cache {
                            self.record_cache().put(key, records.clone());
                        }
                        match breaker {
                            Some((_, error_key)) => self.error_tracker().record_success(error_key),
                            None => self.error_tracker().mark_success(),
                        }
                        Ok(Outcome::Answered(records))
                    }
                    Err(error) if !error.is_counted() => {
                        update_error_stats(self.stats(), &error);
                        match &error {
                            QueryError::Unexpected(_) => {
                                log::warn!("Error resolving {rdtype}:{query}: {error}")
                            }
                            _ => dns_debug!(self, "{error} ({rdtype}:{query})"),
                        }
                        Ok(Outcome::Skipped)
                    }
                    Err(error) => {
                        update_error_stats(self.stats(), &error);
                        let count = breaker
                            .map(|(_, k)| self.error_tracker().record_failure(k))
                            .unwrap_or(0);
                        collected_ref
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .push(error.clone());
                        let attempt = failed_ref.fetch_add(1, Ordering::SeqCst) + 1;
                        if error.is_terminal() {
                            dns_debug!(self, "{error} ({rdtype}:{query}), not retrying");
                        } else {
                            let msg = format!(
                                "DNS error or timeout for {rdtype} query \"{query}\" ({count} so far): {error}"
                            );
                            if should_retry(&error, max_attempts.saturating_sub(attempt)) {
                                log::debug!("{msg}");
                                dns_debug!(self, "Retry (#{attempt}) resolving {rdtype}:{query}");
                            } else {
                                log::info!("{msg}");
                            }
                        }
                        Err(error)
                    }
                }
            }
        };
        let retry_if = |error: &QueryError| {
            should_retry(
                error,
                max_attempts.saturating_sub(failed_ref.load(Ordering::SeqCst)),
            )
        };
        let result = RetryIf::spawn(get_retry_strategy(retries), action, retry_if).await;

        let mut attempts = Attempts {
            records: Vec::new(),
            errors: collected.into_inner().unwrap_or_else(PoisonError::into_inner),
        };
        if let Ok(Outcome::Answered(records)) = result {
            attempts.records = records;
        }

        if !attempts.errors.is_empty() {
            dns_debug!(self, "Errors for {rdtype}:{query}: {:?}", attempts.errors);
        }
        attempts
    }
}
