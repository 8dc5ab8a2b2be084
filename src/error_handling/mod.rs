//! Error handling and resolution statistics.
//!
//! This module provides:
//! - The DNS query failure taxonomy and engine error types
//! - Resolution statistics tracking (cache, queries, failures)
//! - Error categorization for retries and statistics
//!
//! Query failures are categorized into:
//! - **Permanent**: no nameserver could answer; not retried
//! - **Transient**: timeouts; retried up to the configured limit
//! - **Soft**: protocol-level problems treated as empty answers
//! - **Unexpected**: logged and swallowed so one query never aborts a batch

mod categorization;
mod stats;
mod types;

// Re-export public API
pub use categorization::{
    categorize_query_error, get_retry_strategy, should_retry, update_error_stats,
};
pub use stats::ResolutionStats;
pub use types::{EngineError, InitializationError, QueryError, StatKind};
