use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use coinpulse::Config;

pub mod commands;

#[derive(Parser)]
#[command(
    name = "coinpulse",
    about = "Crypto news, sentiment and technical-indicator aggregation",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one aggregation cycle and write snapshot files
    Aggregate {
        /// Asset to aggregate (defaults to every configured asset)
        #[arg(short, long)]
        coin: Option<String>,
    },

    /// Run aggregation at startup and on every scrape interval until Ctrl-C
    Watch,

    /// Refresh spot price files on the price interval
    Prices {
        /// Refresh once and exit
        #[arg(long)]
        once: bool,
    },

    /// Print a stored snapshot
    Show {
        /// Asset id
        #[arg(short, long, default_value = "bitcoin")]
        coin: String,

        /// Snapshot to print
        #[arg(short, long, value_enum, default_value_t = SnapshotArg::Technical)]
        kind: SnapshotArg,
    },

    /// List active agent sessions
    Sessions {
        /// Also print the latest messages of this session
        #[arg(long)]
        history: Option<String>,

        /// Number of history messages
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum SnapshotArg {
    News,
    Technical,
    Price,
    History,
}

/// Execute CLI command
pub async fn run(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::Aggregate { coin } => {
            info!(coin = ?coin, "Running aggregation cycle");
            commands::aggregate(config, coin).await?;
        }
        Commands::Watch => {
            info!("Starting aggregation scheduler");
            commands::watch(config).await?;
        }
        Commands::Prices { once } => {
            info!(once, "Starting price runner");
            commands::prices(config, once).await?;
        }
        Commands::Show { coin, kind } => {
            commands::show(config, coin, kind).await?;
        }
        Commands::Sessions { history, limit } => {
            commands::sessions(config, history, limit).await?;
        }
    }

    Ok(())
}
