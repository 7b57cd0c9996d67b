use clap::Args;
use ledgerbox::{FileSink, FileSource, OperationResult};
use std::path::PathBuf;

use super::open_service;
use crate::config::Config;

/// Write a snapshot of every table to a JSON file
#[derive(Args)]
pub struct ExportCommand {
    /// File to write (default: ledgerbox-backup-YYYY-MM-DD.json in the current directory)
    #[arg(long, short)]
    output: Option<PathBuf>,
}

impl ExportCommand {
    pub async fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let service = open_service(config).await?;
        let sink = match &self.output {
            Some(path) => FileSink::Path(path.clone()),
            None => FileSink::Directory(PathBuf::from(".")),
        };

        let result = service.export_all_data(&sink).await;
        report(result)
    }
}

/// Replace tables with the contents of a snapshot file
#[derive(Args)]
pub struct ImportCommand {
    /// Snapshot file to restore
    path: PathBuf,
}

impl ImportCommand {
    pub async fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let service = open_service(config).await?;
        let source = FileSource::new(&self.path);

        let result = service.import_all_data(&source).await;
        report(result)
    }
}

fn report(result: OperationResult) -> Result<(), Box<dyn std::error::Error>> {
    if result.success {
        println!("{}", result.message.unwrap_or_default());
        Ok(())
    } else {
        Err(result
            .error
            .unwrap_or_else(|| "unknown error".to_string())
            .into())
    }
}
