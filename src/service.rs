//! The four entry points the rest of the application calls.

use serde::Serialize;

use crate::audit::{self, IntegrityReport};
use crate::backup::{self, BackupSink, BackupSource};
use crate::db::RecordStore;
use crate::error::Result;
use crate::seed::{self, SeedReport};
use crate::version::VersionStore;

/// Outcome of a user-triggered backup or restore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OperationResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
        }
    }
}

/// Data context shared by every screen: the record store, the version marker
/// and the center new default records belong to.
pub struct DataService<V: VersionStore> {
    store: RecordStore,
    versions: V,
    center_id: String,
}

impl<V: VersionStore> DataService<V> {
    pub fn new(store: RecordStore, versions: V, center_id: impl Into<String>) -> Self {
        Self {
            store,
            versions,
            center_id: center_id.into(),
        }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn versions(&self) -> &V {
        &self.versions
    }

    pub fn center_id(&self) -> &str {
        &self.center_id
    }

    /// Seeds empty core tables. Errors propagate so the caller can retry.
    pub async fn initialize_default_data(&self) -> Result<SeedReport> {
        seed::initialize_default_data(&self.store, &self.versions, &self.center_id).await
    }

    pub async fn export_all_data<S: BackupSink>(&self, sink: &S) -> OperationResult {
        match backup::export_all_data(&self.store, &self.versions, sink).await {
            Ok(summary) => OperationResult::ok(format!(
                "Exported {} record(s) to {}",
                summary.record_count(),
                summary.location
            )),
            Err(e) => {
                tracing::warn!("Export failed: {}", e);
                OperationResult::failed(e.to_string())
            }
        }
    }

    pub async fn import_all_data<S: BackupSource>(&self, source: &S) -> OperationResult {
        match backup::import_all_data(&self.store, source).await {
            Ok(summary) => {
                let mut message = format!(
                    "Restored {} record(s) across {} table(s) from snapshot {}",
                    summary.record_count(),
                    summary.restored.len(),
                    summary.version
                );
                if !summary.ignored_tables.is_empty() {
                    message.push_str(&format!(
                        "; ignored unknown table(s): {}",
                        summary.ignored_tables.join(", ")
                    ));
                }
                OperationResult::ok(message)
            }
            Err(e) => {
                tracing::warn!("Import failed: {}", e);
                OperationResult::failed(e.to_string())
            }
        }
    }

    pub async fn check_data_integrity(&self) -> Result<IntegrityReport> {
        audit::check_data_integrity(&self.store).await
    }
}
