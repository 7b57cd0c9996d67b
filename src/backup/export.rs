use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use super::{BackupSink, Snapshot};
use crate::db::RecordStore;
use crate::error::Result;
use crate::models::Table;
use crate::version::{VersionStore, CURRENT_DATA_VERSION};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportSummary {
    pub file_name: String,
    pub location: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub counts: BTreeMap<Table, u64>,
}

impl ExportSummary {
    pub fn record_count(&self) -> u64 {
        self.counts.values().sum()
    }
}

/// Reads every table in full into a snapshot.
///
/// All tables are read inside one transaction, so the snapshot reflects a
/// single state of the store. Inactive records are included. A store that was
/// never initialized is stamped with the current data version.
pub async fn build_snapshot<V: VersionStore>(store: &RecordStore, versions: &V) -> Result<Snapshot> {
    let version = versions
        .get_version()
        .await?
        .unwrap_or_else(|| CURRENT_DATA_VERSION.to_string());

    let mut snapshot = Snapshot::new(version, Utc::now());
    let mut tx = store.begin(&Table::ALL).await?;
    for table in Table::ALL {
        let records = tx.get_all(table).await?;
        tracing::debug!("Exporting {} record(s) from {}", records.len(), table);
        snapshot.tables.insert(table, records);
    }
    tx.rollback().await?;

    Ok(snapshot)
}

/// Serializes the whole store and hands it to `sink`.
///
/// Any read failure aborts before anything is delivered.
pub async fn export_all_data<V, S>(store: &RecordStore, versions: &V, sink: &S) -> Result<ExportSummary>
where
    V: VersionStore,
    S: BackupSink,
{
    let snapshot = build_snapshot(store, versions).await?;
    let contents = snapshot.to_json()?;
    let file_name = snapshot.file_name();

    let location = sink.deliver(&file_name, &contents).await?;

    let summary = ExportSummary {
        file_name,
        location,
        version: snapshot.version.clone(),
        timestamp: snapshot.timestamp,
        counts: snapshot.expected_counts(),
    };
    tracing::info!(
        "Exported {} record(s) to {}",
        summary.record_count(),
        summary.location
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::MemorySink;
    use crate::db::RemoveMode;
    use crate::error::StoreError;
    use crate::models::Record;
    use crate::version::MemoryVersionStore;
    use tempfile::TempDir;

    async fn setup_store(temp_dir: &TempDir) -> RecordStore {
        RecordStore::open(&temp_dir.path().join("test.db"))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_snapshot_has_every_table() {
        let temp_dir = TempDir::new().unwrap();
        let store = setup_store(&temp_dir).await;
        store
            .table(Table::Orders)
            .add(Record::new("main").with_field("total", 15))
            .await
            .unwrap();

        let snapshot = build_snapshot(&store, &MemoryVersionStore::with_version("1.0.0"))
            .await
            .unwrap();

        assert_eq!(snapshot.version, "1.0.0");
        assert_eq!(snapshot.tables.len(), Table::ALL.len());
        assert_eq!(snapshot.tables[&Table::Orders].len(), 1);
        assert!(snapshot.tables[&Table::Customers].is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_includes_inactive_records() {
        let temp_dir = TempDir::new().unwrap();
        let store = setup_store(&temp_dir).await;
        let customers = store.table(Table::Customers);
        let id = customers.add(Record::new("main")).await.unwrap();
        customers.remove(&id, RemoveMode::Soft).await.unwrap();

        let snapshot = build_snapshot(&store, &MemoryVersionStore::new())
            .await
            .unwrap();

        assert_eq!(snapshot.version, CURRENT_DATA_VERSION);
        assert_eq!(snapshot.tables[&Table::Customers].len(), 1);
        assert!(!snapshot.tables[&Table::Customers][0].is_active);
    }

    #[tokio::test]
    async fn test_export_delivers_parseable_snapshot() {
        let temp_dir = TempDir::new().unwrap();
        let store = setup_store(&temp_dir).await;
        store
            .table(Table::Payments)
            .bulk_add(&[Record::new("main"), Record::new("main")])
            .await
            .unwrap();
        let sink = MemorySink::new();

        let summary = export_all_data(&store, &MemoryVersionStore::new(), &sink)
            .await
            .unwrap();

        assert_eq!(summary.record_count(), 2);
        assert_eq!(summary.counts[&Table::Payments], 2);

        let (file_name, contents) = sink.last().unwrap();
        assert_eq!(file_name, summary.file_name);
        let parsed = Snapshot::parse(&contents).unwrap();
        assert_eq!(parsed.snapshot.tables[&Table::Payments].len(), 2);
        assert!(parsed.ignored_tables.is_empty());
    }

    #[tokio::test]
    async fn test_export_fails_when_store_closed() {
        let temp_dir = TempDir::new().unwrap();
        let store = setup_store(&temp_dir).await;
        store.pool().close().await;
        let sink = MemorySink::new();

        let result = export_all_data(&store, &MemoryVersionStore::new(), &sink).await;

        assert!(matches!(result, Err(StoreError::Unavailable(_))));
        assert!(sink.last().is_none());
    }
}
