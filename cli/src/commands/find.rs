//! Find command - sweep for a free port.

use std::net::IpAddr;

use anyhow::{bail, Result};
use clap::Args;
use portfinder_core::{ConfigStore, FinderConfig, PortFinder, ProbeOutcome};
use serde::Serialize;
use tracing::warn;

/// Search settings; anything left out comes from the config file.
#[derive(Args, Debug, Default, Clone)]
pub struct SearchArgs {
    /// First port to try
    #[arg(short, long)]
    pub start: Option<u16>,

    /// Number of busy ports to step over before giving up
    #[arg(short, long)]
    pub attempts: Option<u32>,

    /// Time budget for the whole search, in milliseconds
    #[arg(short, long)]
    pub timeout_ms: Option<u64>,

    /// Loopback address to probe
    #[arg(long)]
    pub address: Option<IpAddr>,
}

impl SearchArgs {
    /// Overlay the flags onto the stored settings.
    pub fn resolve(&self, config: &FinderConfig) -> FinderConfig {
        FinderConfig {
            start_port: self.start.unwrap_or(config.start_port),
            max_attempts: self.attempts.unwrap_or(config.max_attempts),
            timeout_ms: self.timeout_ms.unwrap_or(config.timeout_ms),
            address: self.address.unwrap_or(config.address),
        }
    }
}

/// JSON report of a search.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FindReport {
    outcome: ProbeOutcome,
    start_port: u16,
    max_attempts: u32,
    timeout_ms: u64,
    address: IpAddr,
    /// The port is only known to be free at this instant.
    checked_at: String,
}

pub async fn run(args: SearchArgs, json: bool) -> Result<()> {
    let store = ConfigStore::new()?;
    let settings = args.resolve(&store.load().await?);
    let request = settings.to_request()?;

    if !request.fits_port_range() {
        warn!(
            start_port = settings.start_port,
            max_attempts = settings.max_attempts,
            "Search range runs past port 65535"
        );
    }

    let outcome = PortFinder::loopback().find_outcome(&request).await?;

    if json {
        let report = FindReport {
            outcome: outcome.clone(),
            start_port: settings.start_port,
            max_attempts: settings.max_attempts,
            timeout_ms: settings.timeout_ms,
            address: settings.address,
            checked_at: chrono::Utc::now().to_rfc3339(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    match outcome {
        ProbeOutcome::Found { port } => {
            if !json {
                if atty::is(atty::Stream::Stdout) {
                    println!("Free port: {} (on {})", port, settings.address);
                } else {
                    // Bare number so `PORT=$(portfinder find)` works.
                    println!("{}", port);
                }
            }
            Ok(())
        }
        ProbeOutcome::Failed { reason } => bail!("No free port: {}", reason),
    }
}
