//! DNS resolver initialization.
//!
//! This module builds the `hickory-resolver` instance behind
//! [`crate::dns::HickoryClient`].

use std::sync::Arc;
use std::time::Duration;

use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;

use crate::config::EngineConfig;
use crate::error_handling::InitializationError;

/// Initializes the DNS resolver used for engine queries.
///
/// Uses the system resolver configuration (`/etc/resolv.conf` on Unix) and
/// falls back to the library default (Google public DNS) if it cannot be
/// read. The engine runs its own retry loop, so the resolver makes a single
/// attempt per query with the configured `dns_timeout`.
///
/// # Errors
///
/// Returns `InitializationError::DnsResolverError` if `dns_timeout` is not a
/// positive number of seconds that fits in a `Duration`.
pub fn init_resolver(config: &EngineConfig) -> Result<Arc<TokioAsyncResolver>, InitializationError> {
    if !(config.dns_timeout > 0.0 && Duration::try_from_secs_f64(config.dns_timeout).is_ok()) {
        return Err(InitializationError::DnsResolverError(format!(
            "dns_timeout must be a positive number of seconds, got {}",
            config.dns_timeout
        )));
    }

    let (resolver_config, mut opts) = match hickory_resolver::system_conf::read_system_conf() {
        Ok(system) => system,
        Err(e) => {
            log::warn!("Failed to read system DNS configuration, using defaults: {e}");
            (ResolverConfig::default(), ResolverOpts::default())
        }
    };
    opts.timeout = config.timeout();
    opts.attempts = 1;
    // Names are always queried fully qualified
    opts.ndots = 0;

    log::debug!(
        "Initialized DNS resolver with {} nameserver(s)",
        resolver_config.name_servers().len()
    );
    Ok(Arc::new(TokioAsyncResolver::tokio(resolver_config, opts)))
}
