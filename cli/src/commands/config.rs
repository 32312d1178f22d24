//! Config command - show and edit search defaults.

use std::net::IpAddr;

use anyhow::Result;
use clap::Subcommand;
use portfinder_core::{ConfigStore, FinderConfig};

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
    /// Print the configuration file path
    Path,
    /// Restore default settings
    Reset,
    /// Change one or more settings
    Set {
        /// First port to try
        #[arg(long)]
        start_port: Option<u16>,
        /// Number of busy ports to step over before giving up
        #[arg(long)]
        max_attempts: Option<u32>,
        /// Time budget for the whole search, in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
        /// Loopback address to probe
        #[arg(long)]
        address: Option<IpAddr>,
    },
}

pub async fn run(action: ConfigAction, json: bool) -> Result<()> {
    let store = ConfigStore::new()?;

    match action {
        ConfigAction::Show => print_config(&store.load().await?, json)?,
        ConfigAction::Path => println!("{}", store.path().display()),
        ConfigAction::Reset => {
            let config = store.reset().await?;
            print_config(&config, json)?;
        }
        ConfigAction::Set {
            start_port,
            max_attempts,
            timeout_ms,
            address,
        } => {
            let config = store
                .update(|c| {
                    if let Some(v) = start_port {
                        c.start_port = v;
                    }
                    if let Some(v) = max_attempts {
                        c.max_attempts = v;
                    }
                    if let Some(v) = timeout_ms {
                        c.timeout_ms = v;
                    }
                    if let Some(v) = address {
                        c.address = v;
                    }
                })
                .await?;
            print_config(&config, json)?;
        }
    }

    Ok(())
}

fn print_config(config: &FinderConfig, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(config)?);
        return Ok(());
    }

    println!("{:<14} {}", "start port", config.start_port);
    println!("{:<14} {}", "max attempts", config.max_attempts);
    println!("{:<14} {}ms", "timeout", config.timeout_ms);
    println!("{:<14} {}", "address", config.address);
    Ok(())
}
