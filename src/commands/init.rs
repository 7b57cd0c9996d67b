//! Seed default data on first run.

use clap::Args;
use ledgerbox::{SeedDecision, VersionStore};

use super::{open_service, OutputFormat};
use crate::config::Config;

/// Create the store if needed and seed empty core tables
#[derive(Args)]
pub struct InitCommand {
    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    format: OutputFormat,
}

impl InitCommand {
    pub async fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let service = open_service(config).await?;
        let report = service.initialize_default_data().await?;

        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            OutputFormat::Text => {
                for table in &report.tables {
                    match table.decision {
                        SeedDecision::NeedsSeed => {
                            println!("Seeded {}: {} record(s)", table.table, table.inserted)
                        }
                        SeedDecision::AlreadySeeded => {
                            println!("Skipped {}: already has data", table.table)
                        }
                    }
                }

                let version = service.versions().get_version().await?;
                println!();
                println!("Store: {}", config.database_path.value.display());
                println!(
                    "Data version: {}",
                    version.as_deref().unwrap_or("(not set)")
                );
            }
        }
        Ok(())
    }
}
