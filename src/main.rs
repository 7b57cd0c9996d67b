use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

use commands::{
    CheckCommand, ConfigCommand, ExportCommand, ImportCommand, InitCommand, RecordCommand,
};
use config::Config;

#[derive(Parser)]
#[command(name = "ledgerbox")]
#[command(version)]
#[command(about = "Offline-first local record store", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the store and seed default data
    Init(InitCommand),

    /// Report record counts per table
    Check(CheckCommand),

    /// Export every table to a snapshot file
    Export(ExportCommand),

    /// Restore tables from a snapshot file
    Import(ImportCommand),

    /// Read and edit records
    Record(RecordCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ledgerbox=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config)?;

    match cli.command {
        Some(Commands::Init(cmd)) => cmd.run(&config).await?,
        Some(Commands::Check(cmd)) => cmd.run(&config).await?,
        Some(Commands::Export(cmd)) => cmd.run(&config).await?,
        Some(Commands::Import(cmd)) => cmd.run(&config).await?,
        Some(Commands::Record(cmd)) => cmd.run(&config).await?,
        Some(Commands::Config(cmd)) => cmd.run(&config)?,
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}
