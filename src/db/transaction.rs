use serde_json::{Map, Value};
use sqlx::{Sqlite, Transaction};

use super::{ops, RemoveMode};
use crate::error::{Result, StoreError};
use crate::models::{Record, Table};

/// A write transaction over a declared set of tables.
///
/// All operations share one connection. Writes become visible together on
/// `commit`; `rollback` or dropping the guard discards them.
pub struct StoreTransaction {
    tx: Transaction<'static, Sqlite>,
    tables: Vec<Table>,
}

impl StoreTransaction {
    pub(crate) fn new(tx: Transaction<'static, Sqlite>, tables: &[Table]) -> Self {
        Self {
            tx,
            tables: tables.to_vec(),
        }
    }

    /// Tables this transaction may touch.
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    fn check(&self, table: Table) -> Result<()> {
        if self.tables.contains(&table) {
            Ok(())
        } else {
            Err(StoreError::TableNotInTransaction(table))
        }
    }

    pub async fn count(&mut self, table: Table) -> Result<u64> {
        self.check(table)?;
        ops::count(&mut self.tx, table).await
    }

    pub async fn get_all(&mut self, table: Table) -> Result<Vec<Record>> {
        self.check(table)?;
        ops::get_all(&mut self.tx, table).await
    }

    pub async fn get(&mut self, table: Table, id: &str) -> Result<Option<Record>> {
        self.check(table)?;
        ops::get(&mut self.tx, table, id).await
    }

    pub async fn add(&mut self, table: Table, record: Record) -> Result<String> {
        self.check(table)?;
        ops::insert(&mut self.tx, table, &record).await?;
        Ok(record.id)
    }

    pub async fn update(
        &mut self,
        table: Table,
        id: &str,
        partial: Map<String, Value>,
    ) -> Result<Record> {
        self.check(table)?;
        ops::update(&mut self.tx, table, id, partial).await
    }

    pub async fn remove(&mut self, table: Table, id: &str, mode: RemoveMode) -> Result<()> {
        self.check(table)?;
        ops::remove(&mut self.tx, table, id, mode).await
    }

    /// Inserts all records or none, using a savepoint inside this transaction.
    pub async fn bulk_add(&mut self, table: Table, records: &[Record]) -> Result<usize> {
        self.check(table)?;
        ops::bulk_insert(&mut self.tx, table, records).await
    }

    pub async fn clear(&mut self, table: Table) -> Result<u64> {
        self.check(table)?;
        ops::clear(&mut self.tx, table).await
    }

    pub async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        tracing::debug!("Committed transaction over {:?}", self.tables);
        Ok(())
    }

    pub async fn rollback(self) -> Result<()> {
        self.tx.rollback().await?;
        tracing::debug!("Rolled back transaction over {:?}", self.tables);
        Ok(())
    }
}
