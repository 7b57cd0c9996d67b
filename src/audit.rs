//! Read-only row count diagnostics.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::db::RecordStore;
use crate::error::Result;
use crate::models::Table;

/// Row count per known table. Serializes as `{ "customers": 2, ... }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct IntegrityReport {
    counts: BTreeMap<Table, u64>,
}

/// A table whose count differs from what was expected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountMismatch {
    pub table: Table,
    pub expected: u64,
    pub actual: u64,
}

impl IntegrityReport {
    pub fn from_counts(counts: BTreeMap<Table, u64>) -> Self {
        Self { counts }
    }

    pub fn get(&self, table: Table) -> u64 {
        self.counts.get(&table).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn counts(&self) -> &BTreeMap<Table, u64> {
        &self.counts
    }

    /// Compares against expected counts for the tables listed in `expected`.
    pub fn diff(&self, expected: &BTreeMap<Table, u64>) -> Vec<CountMismatch> {
        expected
            .iter()
            .filter(|(table, count)| self.get(**table) != **count)
            .map(|(table, count)| CountMismatch {
                table: *table,
                expected: *count,
                actual: self.get(*table),
            })
            .collect()
    }
}

impl fmt::Display for IntegrityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (table, count) in &self.counts {
            writeln!(f, "{:<14} {}", table.name(), count)?;
        }
        write!(f, "{:<14} {}", "total", self.total())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableStats {
    pub table: Table,
    pub total: u64,
    pub active: u64,
    pub inactive: u64,
}

/// Counts every known table.
///
/// Counts are taken inside one read transaction, so they describe a single
/// consistent state of the store. Nothing is cached.
pub async fn check_data_integrity(store: &RecordStore) -> Result<IntegrityReport> {
    let mut tx = store.begin(&Table::ALL).await?;
    let mut counts = BTreeMap::new();
    for table in Table::ALL {
        counts.insert(table, tx.count(table).await?);
    }
    tx.rollback().await?;

    Ok(IntegrityReport { counts })
}

/// Total, active, and soft-deleted counts per table.
pub async fn table_stats(store: &RecordStore) -> Result<Vec<TableStats>> {
    let mut stats = Vec::with_capacity(Table::ALL.len());
    for table in Table::ALL {
        let handle = store.table(table);
        let total = handle.count().await?;
        let active = handle.count_active().await?;
        stats.push(TableStats {
            table,
            total,
            active,
            inactive: total.saturating_sub(active),
        });
    }
    Ok(stats)
}
