//! PortFinder CLI - Find a free TCP port on localhost
//!
//! A command-line tool for finding ports nothing is listening on,
//! checking single ports, and managing search defaults.

mod commands;
mod logging;

use std::net::IpAddr;

use clap::{Parser, Subcommand};

use commands::config::ConfigAction;
use commands::find::SearchArgs;

#[derive(Parser)]
#[command(name = "portfinder")]
#[command(author, version, about = "Find a free TCP port on localhost")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Log more (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Find the first free port at or above a start port
    Find(SearchArgs),

    /// Check whether a single port is free
    Check {
        /// Port number to check
        port: u16,

        /// Loopback address to probe
        #[arg(long)]
        address: Option<IpAddr>,
    },

    /// Show or change search defaults
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    match cli.command {
        Some(Commands::Find(args)) => commands::find::run(args, cli.json).await?,
        Some(Commands::Check { port, address }) => {
            commands::check::run(port, address, cli.json).await?
        }
        Some(Commands::Config { action }) => commands::config::run(action, cli.json).await?,
        // Default: search with the configured defaults
        None => commands::find::run(SearchArgs::default(), cli.json).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_find_flags() {
        let cli = Cli::parse_from([
            "portfinder", "find", "-s", "9000", "-a", "5", "-t", "250", "--json", "-vv",
        ]);
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);

        match cli.command {
            Some(Commands::Find(args)) => {
                assert_eq!(args.start, Some(9000));
                assert_eq!(args.attempts, Some(5));
                assert_eq!(args.timeout_ms, Some(250));
                assert_eq!(args.address, None);
            }
            _ => panic!("expected find"),
        }
    }

    #[test]
    fn test_parse_check_and_config() {
        let cli = Cli::parse_from(["portfinder", "check", "8080", "--address", "::1"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Check { port: 8080, address: Some(addr) }) if addr.is_loopback()
        ));

        let cli = Cli::parse_from(["portfinder", "config", "set", "--max-attempts", "3"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Config {
                action: ConfigAction::Set {
                    max_attempts: Some(3),
                    ..
                }
            })
        ));
    }

    #[test]
    fn test_rejects_out_of_range_port() {
        assert!(Cli::try_parse_from(["portfinder", "check", "70000"]).is_err());
    }
}
