//! Query error categorization.
//!
//! Maps protocol-client failures onto statistics and retry decisions, and
//! builds the retry strategy used by every lookup.

use std::time::Duration;
use tokio_retry::strategy::FixedInterval;

use super::stats::ResolutionStats;
use super::types::{QueryError, StatKind};

/// Creates the retry strategy for a lookup.
///
/// DNS retries are immediate: the per-query timeout already spaces them out.
/// The iterator yields one zero delay per retry, so a lookup makes at most
/// `retries + 1` attempts.
pub fn get_retry_strategy(retries: u32) -> impl Iterator<Item = Duration> {
    FixedInterval::new(Duration::ZERO).take(retries as usize)
}

/// Categorizes a `QueryError` into a `StatKind`.
pub fn categorize_query_error(error: &QueryError) -> StatKind {
    match error {
        QueryError::NoNameservers(_) => StatKind::NoNameservers,
        QueryError::Timeout => StatKind::Timeout,
        QueryError::Protocol(_) => StatKind::ProtocolError,
        QueryError::Unexpected(_) => StatKind::UnexpectedError,
    }
}

/// Records a query failure in the statistics.
pub fn update_error_stats(stats: &ResolutionStats, error: &QueryError) {
    stats.increment(categorize_query_error(error));
}

/// Whether another attempt should follow `error` when `tries_left` attempts remain.
pub fn should_retry(error: &QueryError, tries_left: u32) -> bool {
    error.is_transient() && tries_left > 0
}
