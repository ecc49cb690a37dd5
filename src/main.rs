use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod convert;
mod ledger;
mod manifest;
mod reconcile;
mod remote;

use commands::{ConfigCommand, StatusCommand, SyncCommand};
use config::Config;

#[derive(Parser)]
#[command(name = "docsync")]
#[command(version)]
#[command(about = "Synchronize repository documentation with Confluence", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile manifest documents with the remote space
    Sync(SyncCommand),

    /// Show configuration, ledger state and server status
    Status(StatusCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docsync=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run().await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

async fn run() -> Result<i32, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config)?;

    match cli.command {
        Commands::Sync(cmd) => Ok(cmd.run(&config).await?),
        Commands::Status(cmd) => {
            cmd.run(&config).await;
            Ok(0)
        }
        Commands::Config(cmd) => {
            cmd.run(&config)?;
            Ok(0)
        }
    }
}
