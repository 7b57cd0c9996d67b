use clap::{Args, Subcommand};
use ledgerbox::{Record, RemoveMode, Table};
use serde_json::{Map, Value};
use std::io::{self, Write};

use super::{open_service, OutputFormat};
use crate::config::Config;

#[derive(Args)]
pub struct RecordCommand {
    #[command(subcommand)]
    pub command: RecordSubcommand,
}

#[derive(Subcommand)]
pub enum RecordSubcommand {
    /// List records in a table
    List {
        /// Table name (customers, products, orders, invoices, payments, trackSheets)
        table: Table,

        /// Include soft-deleted records
        #[arg(long, short)]
        all: bool,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show one record
    Show {
        table: Table,

        /// Record ID
        id: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Add a record
    Add {
        table: Table,

        /// Record ID (default: a new UUID)
        #[arg(long)]
        id: Option<String>,

        /// Center ID (default: default_center_id from config)
        #[arg(long)]
        center: Option<String>,

        /// Field as KEY=VALUE; VALUE is read as JSON when it parses (can be repeated)
        #[arg(long = "field", value_name = "KEY=VALUE", value_parser = parse_field)]
        fields: Vec<(String, Value)>,
    },

    /// Merge fields into a record
    Update {
        table: Table,

        /// Record ID
        id: String,

        /// Field as KEY=VALUE (can be repeated)
        #[arg(long = "field", value_name = "KEY=VALUE", value_parser = parse_field)]
        fields: Vec<(String, Value)>,
    },

    /// Remove a record (soft delete unless --hard)
    Remove {
        table: Table,

        /// Record ID
        id: String,

        /// Delete the row instead of marking it inactive
        #[arg(long)]
        hard: bool,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },

    /// Count records in a table
    Count { table: Table },
}

/// Parses `KEY=VALUE`, keeping VALUE as a string when it is not JSON.
fn parse_field(s: &str) -> Result<(String, Value), String> {
    let (key, raw) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
    if key.trim().is_empty() {
        return Err(format!("empty key in '{}'", s));
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.trim().to_string(), value))
}

fn to_map(fields: &[(String, Value)]) -> Map<String, Value> {
    fields.iter().cloned().collect()
}

impl RecordCommand {
    pub async fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let service = open_service(config).await?;
        let store = service.store();

        match &self.command {
            RecordSubcommand::List { table, all, format } => {
                let records: Vec<Record> = store
                    .table(*table)
                    .get_all()
                    .await?
                    .into_iter()
                    .filter(|r| *all || r.is_active)
                    .collect();

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&records)?);
                    }
                    OutputFormat::Text => {
                        if records.is_empty() {
                            println!("No records in {}", table);
                            return Ok(());
                        }
                        println!("{:<36}  {:<12}  {:<6}  NAME", "ID", "CENTER", "ACTIVE");
                        println!("{}", "-".repeat(80));
                        for record in &records {
                            let name = record
                                .field("name")
                                .and_then(Value::as_str)
                                .unwrap_or("");
                            println!(
                                "{:<36}  {:<12}  {:<6}  {}",
                                record.id,
                                record.center_id,
                                if record.is_active { "yes" } else { "no" },
                                name
                            );
                        }
                        println!("\nTotal: {} record(s)", records.len());
                    }
                }
                Ok(())
            }

            RecordSubcommand::Show { table, id, format } => {
                match store.table(*table).get(id).await? {
                    Some(record) => {
                        match format {
                            OutputFormat::Json => {
                                println!("{}", serde_json::to_string_pretty(&record)?);
                            }
                            OutputFormat::Text => {
                                print!("{}", record);
                            }
                        }
                        Ok(())
                    }
                    None => Err(format!("Record not found in {}: {}", table, id).into()),
                }
            }

            RecordSubcommand::Add {
                table,
                id,
                center,
                fields,
            } => {
                let center = center
                    .clone()
                    .unwrap_or_else(|| service.center_id().to_string());
                let mut record = Record::new(center).with_fields(to_map(fields));
                if let Some(id) = id {
                    record = record.with_id(id.clone());
                }

                let id = store.table(*table).add(record).await?;
                println!("Added {} record: {}", table, id);
                Ok(())
            }

            RecordSubcommand::Update { table, id, fields } => {
                if fields.is_empty() {
                    return Err("Nothing to update. Provide at least one --field.".into());
                }

                let updated = store.table(*table).update(id, to_map(fields)).await?;
                println!("Updated {} record:", table);
                print!("{}", updated);
                Ok(())
            }

            RecordSubcommand::Remove {
                table,
                id,
                hard,
                force,
            } => {
                if !force {
                    let action = if *hard { "Delete" } else { "Deactivate" };
                    print!("{} {} record '{}'? [y/N] ", action, table, id);
                    io::stdout().flush()?;

                    let mut input = String::new();
                    io::stdin().read_line(&mut input)?;

                    if !input.trim().eq_ignore_ascii_case("y") {
                        println!("Removal cancelled.");
                        return Ok(());
                    }
                }

                let mode = if *hard {
                    RemoveMode::Hard
                } else {
                    RemoveMode::Soft
                };
                store.table(*table).remove(id, mode).await?;
                println!("Removed {} record: {}", table, id);
                Ok(())
            }

            RecordSubcommand::Count { table } => {
                let handle = store.table(*table);
                println!(
                    "{}: {} ({} active)",
                    table,
                    handle.count().await?,
                    handle.count_active().await?
                );
                Ok(())
            }
        }
    }
}
