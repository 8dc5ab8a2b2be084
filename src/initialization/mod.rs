//! Process-level setup.
//!
//! This module provides:
//! - Logger initialization (`env_logger`, plain or JSON output)
//! - DNS resolver initialization for the production protocol client
//!
//! All initialization functions return `InitializationError` on failure.

mod logger;
mod resolver;

// Re-export public API
pub use logger::init_logger_with;
pub use resolver::init_resolver;
