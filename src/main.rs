//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `dns_recon` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - Printing operation results as JSON
//!
//! All resolution logic is implemented in the library crate.

use std::process;

use anyhow::{Context, Result};
use clap::Parser;

use dns_recon::config::{Command, Opt};
use dns_recon::domain::is_ip;
use dns_recon::initialization::init_logger_with;
use dns_recon::ops::Request;
use dns_recon::{DnsEngine, EngineError, EventKind, Query};

/// Maps a CLI subcommand onto an engine request.
fn request_for(command: Command) -> Result<Request> {
    let request = match command {
        Command::Resolve { target, rdtype } => Request::Resolve {
            query: target,
            rdtype: Some(rdtype),
            use_cache: true,
        },
        Command::Batch { targets } => Request::ResolveBatch {
            queries: targets,
            rdtype: None,
        },
        Command::RawBatch { queries } => Request::ResolveRawBatch {
            queries: queries
                .iter()
                .map(|q| q.parse::<Query>())
                .collect::<Result<Vec<Query>, EngineError>>()
                .context("Invalid query, expected target[:TYPE]")?,
        },
        Command::Event { host, minimal } => Request::ResolveEvent {
            kind: if is_ip(&host) {
                EventKind::IpAddress
            } else {
                EventKind::DnsName
            },
            host,
            minimal,
        },
        Command::Wildcard { host } => Request::IsWildcard {
            query: host,
            ips: None,
            rdtype: None,
        },
        Command::WildcardDomain { domain } => Request::IsWildcardDomain {
            domain,
            log_info: true,
        },
    };
    Ok(request)
}

async fn run(opt: Opt) -> Result<()> {
    let config = opt
        .engine_config()
        .context("Failed to load engine configuration")?;
    let engine = DnsEngine::with_resolver(config).context("Failed to initialize DNS resolver")?;

    let request = request_for(opt.command)?;
    let operation = request.operation();
    let response = engine
        .dispatch(request)
        .await
        .with_context(|| format!("{operation} failed"))?;

    println!(
        "{}",
        serde_json::to_string_pretty(&response).context("Failed to serialize result")?
    );
    engine.log_stats();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file (if it exists), e.g. RUST_LOG
    if dotenvy::dotenv().is_err() {
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let env_path = exe_dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                }
            }
        }
    }

    let opt = Opt::parse();
    init_logger_with(opt.log_level.clone().into(), opt.log_format.clone())
        .context("Failed to initialize logger")?;

    if let Err(e) = run(opt).await {
        eprintln!("dns_recon error: {e:#}");
        process::exit(1);
    }
    Ok(())
}
