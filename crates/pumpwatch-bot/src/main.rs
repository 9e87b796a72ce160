//! pumpwatch - pump.fun smart-wallet tracker.
//!
//! `run` streams trades of watched wallets and alerts on buys and sells.
//! `list`, `add` and `remove` manage the watch-list file.

use anyhow::Result;
use clap::{Parser, Subcommand};
use pumpwatch_bot::commands;
use tracing::info;

/// pump.fun smart-wallet tracker
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via PUMPWATCH_CONFIG env var)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Stream and alert (default)
    Run,
    /// Print the watch-list
    List,
    /// Watch a wallet
    Add {
        address: String,
        /// Up to 10 characters
        label: String,
    },
    /// Stop watching a wallet
    Remove { address: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Determine config path: CLI arg > PUMPWATCH_CONFIG env var > default
    let config_path = pumpwatch_bot::AppConfig::resolve_path(args.config);
    let config = pumpwatch_bot::AppConfig::load(&config_path)?;

    pumpwatch_telemetry::init_logging(&config.telemetry.log_level)?;

    let registry_path = config.registry.path.clone();
    match args.command.unwrap_or(Command::Run) {
        Command::Run => {
            info!(
                config_path = %config_path,
                "Starting pumpwatch v{}",
                env!("CARGO_PKG_VERSION")
            );
            let app = pumpwatch_bot::Application::new(config).await?;
            app.run().await?;
        }
        Command::List => {
            println!("{}", commands::list(&registry_path).await?);
        }
        Command::Add { address, label } => {
            let entry = commands::add(&registry_path, &address, &label).await?;
            println!("added {}: {}", entry.label, entry.address);
        }
        Command::Remove { address } => {
            let entry = commands::remove(&registry_path, &address).await?;
            println!("removed {}", entry.address);
        }
    }

    Ok(())
}
