//! Engine configuration and constants.
//!
//! This module provides:
//! - Configuration constants (timeouts, limits, defaults)
//! - The engine configuration deserialized from `dns_*` keys
//! - CLI option types and parsing

mod constants;
mod types;

// Re-export all constants
pub use constants::*;
pub use types::{Command, EngineConfig, LogFormat, LogLevel, OmitQueries, Opt};
