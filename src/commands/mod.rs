mod backup;
mod check;
mod config_cmd;
mod init;
mod record;

pub use backup::{ExportCommand, ImportCommand};
pub use check::CheckCommand;
pub use config_cmd::ConfigCommand;
pub use init::InitCommand;
pub use record::RecordCommand;

use clap::ValueEnum;
use ledgerbox::{DataService, FileVersionStore, RecordStore};

use crate::config::Config;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Opens the configured store and version marker.
pub async fn open_service(
    config: &Config,
) -> Result<DataService<FileVersionStore>, Box<dyn std::error::Error>> {
    let store = RecordStore::open(&config.database_path.value).await?;
    let versions = FileVersionStore::new(config.version_path.value.clone());
    Ok(DataService::new(
        store,
        versions,
        config.default_center_id.value.clone(),
    ))
}
