//! Configuration types and CLI options.
//!
//! This module defines the engine configuration (deserialized from JSON using
//! the same `dns_*` keys the scanner configuration uses) and the enums and
//! structs used for command-line argument parsing.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;

use crate::config::constants::*;
use crate::dns::RecordType;
use crate::error_handling::InitializationError;

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// Controls how log messages are formatted:
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Resolution engine configuration.
///
/// Field names match the scanner's configuration keys so a scan config
/// document can be deserialized directly. Missing keys fall back to the
/// defaults in [`crate::config`].
///
/// # Examples
///
/// ```
/// use dns_recon::EngineConfig;
///
/// let config = EngineConfig::from_json_str(r#"{"dns_retries": 3, "dns_debug": true}"#).unwrap();
/// assert_eq!(config.dns_retries, 3);
/// assert_eq!(config.dns_abort_threshold, 50);
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Per-query timeout in seconds
    pub dns_timeout: f64,

    /// Additional attempts after the first failure
    pub dns_retries: u32,

    /// Failure count per parent domain and record type that aborts further queries
    pub dns_abort_threshold: u32,

    /// Maximum DNS resolve distance (consumed by callers, not enforced here)
    pub max_dns_resolve_distance: u32,

    /// `type:suffix` pairs that are never queried
    pub dns_omit_queries: Vec<String>,

    /// Domain suffixes exempt from wildcard detection
    pub dns_wildcard_ignore: Vec<String>,

    /// Random-subdomain probes per record type during wildcard detection
    pub dns_wildcard_tests: usize,

    /// Drop PTR results that look like auto-generated reverse names
    pub dns_filter_ptrs: bool,

    /// Verbose per-query diagnostics
    pub dns_debug: bool,

    /// Maximum in-flight queries per batch
    pub dns_batch_concurrency: usize,

    /// Capacity of the raw answer cache
    pub dns_cache_size: usize,

    /// Seconds after a successful query during which connectivity is assumed
    pub dns_connectivity_interval: f64,

    /// Name resolved by the connectivity check
    pub dns_connectivity_check_name: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dns_timeout: DEFAULT_DNS_TIMEOUT_SECS,
            dns_retries: DEFAULT_DNS_RETRIES,
            dns_abort_threshold: DEFAULT_DNS_ABORT_THRESHOLD,
            max_dns_resolve_distance: DEFAULT_MAX_DNS_RESOLVE_DISTANCE,
            dns_omit_queries: Vec::new(),
            dns_wildcard_ignore: Vec::new(),
            dns_wildcard_tests: DEFAULT_DNS_WILDCARD_TESTS,
            dns_filter_ptrs: true,
            dns_debug: false,
            dns_batch_concurrency: DEFAULT_BATCH_CONCURRENCY,
            dns_cache_size: RECORD_CACHE_CAPACITY,
            dns_connectivity_interval: CONNECTIVITY_INTERVAL.as_secs_f64(),
            dns_connectivity_check_name: CONNECTIVITY_CHECK_NAME.to_string(),
        }
    }
}

impl EngineConfig {
    /// Parses a configuration from a JSON document. Unknown keys are ignored.
    pub fn from_json_str(raw: &str) -> Result<Self, InitializationError> {
        serde_json::from_str(raw).map_err(|e| InitializationError::ConfigError(e.to_string()))
    }

    /// Reads and parses a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns `InitializationError::ConfigError` if the file cannot be read
    /// or is not valid JSON.
    pub fn from_json_file(path: &Path) -> Result<Self, InitializationError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            InitializationError::ConfigError(format!("{}: {e}", path.display()))
        })?;
        Self::from_json_str(&raw)
    }

    /// Per-query timeout as a `Duration`. Non-positive values fall back to the default.
    pub fn timeout(&self) -> Duration {
        duration_or(self.dns_timeout, DEFAULT_DNS_TIMEOUT_SECS)
    }

    /// Connectivity window as a `Duration`.
    pub fn connectivity_interval(&self) -> Duration {
        duration_or(
            self.dns_connectivity_interval,
            CONNECTIVITY_INTERVAL.as_secs_f64(),
        )
    }

    /// Batch concurrency, never zero.
    pub fn batch_concurrency(&self) -> usize {
        self.dns_batch_concurrency.max(1)
    }

    /// Wildcard ignore list, trimmed and lowercased.
    pub fn wildcard_ignore(&self) -> Vec<String> {
        self.dns_wildcard_ignore
            .iter()
            .map(|d| d.trim().trim_end_matches('.').to_lowercase())
            .filter(|d| !d.is_empty())
            .collect()
    }

    /// Parses `dns_omit_queries` into a lookup table.
    pub fn omit_queries(&self) -> OmitQueries {
        OmitQueries::parse(&self.dns_omit_queries)
    }
}

/// Converts positive seconds to a `Duration`, falling back to `default` for
/// values that are non-positive or do not fit.
fn duration_or(secs: f64, default: f64) -> Duration {
    if secs > 0.0 {
        if let Ok(duration) = Duration::try_from_secs_f64(secs) {
            return duration;
        }
    }
    Duration::try_from_secs_f64(default).unwrap_or(Duration::from_secs(5))
}

/// Queries that must never be sent, keyed by record type.
#[derive(Debug, Clone, Default)]
pub struct OmitQueries {
    by_type: HashMap<RecordType, HashSet<String>>,
}

impl OmitQueries {
    /// Builds the table from `type:name` entries. Malformed entries are skipped.
    pub fn parse<S: AsRef<str>>(entries: &[S]) -> Self {
        let mut by_type: HashMap<RecordType, HashSet<String>> = HashMap::new();
        for entry in entries {
            let entry = entry.as_ref();
            let parts: Vec<&str> = entry.split(':').collect();
            if parts.len() != 2 {
                log::warn!("Ignoring malformed dns_omit_queries entry \"{entry}\"");
                continue;
            }
            let Ok(rdtype) = parts[0].trim().parse::<RecordType>() else {
                log::warn!("Ignoring dns_omit_queries entry \"{entry}\": unknown record type");
                continue;
            };
            by_type
                .entry(rdtype)
                .or_default()
                .insert(parts[1].trim().to_lowercase());
        }
        Self { by_type }
    }

    /// Whether `query` equals or is a subdomain of an omitted name for `rdtype`.
    pub fn is_omitted(&self, rdtype: RecordType, query: &str) -> bool {
        self.by_type.get(&rdtype).is_some_and(|names| {
            names
                .iter()
                .any(|h| query == h || query.ends_with(&format!(".{h}")))
        })
    }

    /// Whether the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty()
    }
}

/// Command-line options for the `dns_recon` binary.
#[derive(Debug, Parser)]
#[command(
    name = "dns_recon",
    about = "Resolve hosts and detect wildcard DNS",
    version
)]
pub struct Opt {
    /// JSON configuration file with `dns_*` keys
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log level (overrides RUST_LOG)
    #[arg(long, global = true, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Log format
    #[arg(long, global = true, value_enum, default_value = "plain")]
    pub log_format: LogFormat,

    /// Per-query timeout in seconds (overrides the config file)
    #[arg(long, global = true)]
    pub timeout: Option<f64>,

    /// Retries after the first failure (overrides the config file)
    #[arg(long, global = true)]
    pub retries: Option<u32>,

    /// Enable per-query DNS diagnostics
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Operations available from the command line.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Resolve a hostname or reverse-resolve an IP address
    Resolve {
        /// Hostname or IP address
        target: String,
        /// Record type, or "all"
        #[arg(short = 't', long = "type", default_value = "A")]
        rdtype: String,
    },
    /// Resolve many targets concurrently
    Batch {
        /// Hostnames or IP addresses
        targets: Vec<String>,
    },
    /// Resolve `target:type` pairs and print the extracted records
    RawBatch {
        /// Queries such as `example.com:MX`
        queries: Vec<String>,
    },
    /// Resolve a host for every relevant record type and tag it
    Event {
        /// Hostname or IP address
        host: String,
        /// Only resolve A/AAAA (or nothing for IPs)
        #[arg(long)]
        minimal: bool,
    },
    /// Check whether a host is a wildcard entry
    Wildcard {
        /// Hostname to check
        host: String,
    },
    /// Check whether a domain or any of its parents serves wildcard DNS
    WildcardDomain {
        /// Domain to probe
        domain: String,
    },
}

impl Opt {
    /// Loads the engine configuration and applies command-line overrides.
    pub fn engine_config(&self) -> Result<EngineConfig, InitializationError> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::from_json_file(path)?,
            None => EngineConfig::default(),
        };
        if let Some(timeout) = self.timeout {
            config.dns_timeout = timeout;
        }
        if let Some(retries) = self.retries {
            config.dns_retries = retries;
        }
        if self.debug {
            config.dns_debug = true;
        }
        Ok(config)
    }
}
