use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use super::{BackupSource, Snapshot};
use crate::audit::check_data_integrity;
use crate::db::RecordStore;
use crate::error::{Result, StoreError};
use crate::models::{Record, Table};
use crate::version::CURRENT_DATA_VERSION;

/// Progress of one import.
///
/// `Idle -> AwaitingFile -> Parsing -> ParseFailed | Transacting`, then
/// `Transacting -> TransactionFailed | Committed`. A failed or cancelled pick
/// returns to `Idle` with the store untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportPhase {
    Idle,
    AwaitingFile,
    Parsing,
    ParseFailed,
    Transacting,
    TransactionFailed,
    Committed,
}

impl ImportPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ImportPhase::ParseFailed | ImportPhase::TransactionFailed | ImportPhase::Committed
        )
    }
}

impl fmt::Display for ImportPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImportPhase::Idle => "idle",
            ImportPhase::AwaitingFile => "awaiting file",
            ImportPhase::Parsing => "parsing",
            ImportPhase::ParseFailed => "parse failed",
            ImportPhase::Transacting => "transacting",
            ImportPhase::TransactionFailed => "transaction failed",
            ImportPhase::Committed => "committed",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportSummary {
    pub version: String,
    pub timestamp: DateTime<Utc>,
    /// Rows written per restored table.
    pub restored: BTreeMap<Table, u64>,
    /// Snapshot keys that named no known table.
    pub ignored_tables: Vec<String>,
    pub phase: ImportPhase,
}

impl ImportSummary {
    pub fn record_count(&self) -> u64 {
        self.restored.values().sum()
    }
}

/// Runs one import and remembers how far it got.
pub struct Importer<'a> {
    store: &'a RecordStore,
    phase: ImportPhase,
}

impl<'a> Importer<'a> {
    pub fn new(store: &'a RecordStore) -> Self {
        Self {
            store,
            phase: ImportPhase::Idle,
        }
    }

    pub fn phase(&self) -> ImportPhase {
        self.phase
    }

    fn transition(&mut self, next: ImportPhase) {
        tracing::debug!("Import: {} -> {}", self.phase, next);
        self.phase = next;
    }

    /// Asks `source` for snapshot text, then restores it.
    pub async fn run<S: BackupSource>(&mut self, source: &S) -> Result<ImportSummary> {
        self.transition(ImportPhase::AwaitingFile);
        let text = match source.pick().await {
            Ok(text) => text,
            Err(err) => {
                self.transition(ImportPhase::Idle);
                return Err(err);
            }
        };
        self.restore_text(&text).await
    }

    /// Parses `text` and replaces every table it contains in one transaction.
    ///
    /// Parse errors return before any table is touched. A failure inside the
    /// transaction rolls back every clear and insert.
    pub async fn restore_text(&mut self, text: &str) -> Result<ImportSummary> {
        self.transition(ImportPhase::Parsing);
        let parsed = match Snapshot::parse(text).and_then(|parsed| {
            parsed.snapshot.check_compatible(CURRENT_DATA_VERSION)?;
            Ok(parsed)
        }) {
            Ok(parsed) => parsed,
            Err(err) => {
                self.transition(ImportPhase::ParseFailed);
                tracing::warn!("Rejected snapshot: {}", err);
                return Err(err);
            }
        };

        for key in &parsed.ignored_tables {
            tracing::warn!("Ignoring unknown table '{}' in snapshot", key);
        }

        let snapshot = parsed.snapshot;
        let expected = snapshot.expected_counts();
        let tables: Vec<Table> = snapshot.tables.keys().copied().collect();
        let batches: Vec<(Table, Vec<Record>)> = snapshot.tables.into_iter().collect();

        self.transition(ImportPhase::Transacting);
        let result = self
            .store
            .transaction(&tables, move |tx| {
                Box::pin(async move {
                    let mut restored = BTreeMap::new();
                    for (table, records) in batches {
                        let cleared = tx.clear(table).await?;
                        let inserted = tx.bulk_add(table, &records).await?;
                        tracing::debug!(
                            "Restoring {}: cleared {}, inserted {}",
                            table,
                            cleared,
                            inserted
                        );
                        restored.insert(table, inserted as u64);
                    }
                    Ok::<_, StoreError>(restored)
                })
            })
            .await;

        let restored = match result {
            Ok(restored) => restored,
            Err(err) => {
                self.transition(ImportPhase::TransactionFailed);
                return Err(err);
            }
        };
        self.transition(ImportPhase::Committed);

        // The restore is already durable; a failed recount only warns
        match check_data_integrity(self.store).await {
            Ok(report) => {
                for mismatch in report.diff(&expected) {
                    tracing::warn!(
                        "Post-import count mismatch in {}: expected {}, found {}",
                        mismatch.table,
                        mismatch.expected,
                        mismatch.actual
                    );
                }
            }
            Err(err) => tracing::warn!("Post-import integrity check failed: {}", err),
        }

        let summary = ImportSummary {
            version: snapshot.version,
            timestamp: snapshot.timestamp,
            restored,
            ignored_tables: parsed.ignored_tables,
            phase: self.phase,
        };
        tracing::info!(
            "Imported {} record(s) from snapshot {} ({})",
            summary.record_count(),
            summary.version,
            summary.timestamp
        );
        Ok(summary)
    }
}

/// Imports a snapshot picked by `source`, replacing the tables it contains.
pub async fn import_all_data<S: BackupSource>(
    store: &RecordStore,
    source: &S,
) -> Result<ImportSummary> {
    Importer::new(store).run(source).await
}
