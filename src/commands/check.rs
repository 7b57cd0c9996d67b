use clap::Args;
use ledgerbox::table_stats;

use super::{open_service, OutputFormat};
use crate::config::Config;

/// Count the records in every table
#[derive(Args)]
pub struct CheckCommand {
    /// Split counts into active and soft-deleted records
    #[arg(long, short)]
    detailed: bool,

    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    format: OutputFormat,
}

impl CheckCommand {
    pub async fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let service = open_service(config).await?;

        if self.detailed {
            let stats = table_stats(service.store()).await?;
            match self.format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&stats)?);
                }
                OutputFormat::Text => {
                    println!(
                        "{:<14}  {:>8}  {:>8}  {:>8}",
                        "TABLE", "TOTAL", "ACTIVE", "INACTIVE"
                    );
                    println!("{}", "-".repeat(46));
                    for s in &stats {
                        println!(
                            "{:<14}  {:>8}  {:>8}  {:>8}",
                            s.table.name(),
                            s.total,
                            s.active,
                            s.inactive
                        );
                    }
                }
            }
            return Ok(());
        }

        let report = service.check_data_integrity().await?;
        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            OutputFormat::Text => {
                println!("{}", report);
            }
        }
        Ok(())
    }
}
