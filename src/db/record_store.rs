use futures::future::BoxFuture;
use serde_json::{Map, Value};
use sqlx::SqlitePool;
use std::path::Path;

use super::{init_db, ops, StoreTransaction};
use crate::error::Result;
use crate::models::{Record, Table};

/// How `remove` treats a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RemoveMode {
    /// Mark the record inactive and keep the row.
    #[default]
    Soft,
    /// Delete the row.
    Hard,
}

/// Local record store: one table per entity kind plus multi-table transactions.
#[derive(Clone)]
pub struct RecordStore {
    pool: SqlitePool,
}

impl RecordStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens (creating if needed) the store at `path`.
    pub async fn open(path: &Path) -> Result<Self> {
        Ok(Self::new(init_db(path).await?))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Returns a handle for single-table operations.
    pub fn table(&self, table: Table) -> TableHandle<'_> {
        TableHandle { store: self, table }
    }

    /// Starts a transaction spanning `tables`.
    ///
    /// Nothing written through the returned guard is visible until `commit`.
    /// Dropping the guard rolls everything back.
    pub async fn begin(&self, tables: &[Table]) -> Result<StoreTransaction> {
        let tx = self.pool.begin().await?;
        tracing::debug!("Began transaction over {:?}", tables);
        Ok(StoreTransaction::new(tx, tables))
    }

    /// Runs `work` inside a transaction spanning `tables`.
    ///
    /// Commits when `work` returns `Ok`; on `Err` every write is rolled back
    /// and the error is returned unchanged.
    pub async fn transaction<F, R>(&self, tables: &[Table], work: F) -> Result<R>
    where
        F: for<'c> FnOnce(&'c mut StoreTransaction) -> BoxFuture<'c, Result<R>>,
    {
        let mut tx = self.begin(tables).await?;

        match work(&mut tx).await {
            Ok(value) => {
                tx.commit().await?;
                Ok(value)
            }
            Err(err) => {
                tracing::warn!("Rolling back transaction: {}", err);
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!("Rollback failed: {}", rollback_err);
                }
                Err(err)
            }
        }
    }
}

/// Single-table operations, each running on its own pooled connection.
pub struct TableHandle<'a> {
    store: &'a RecordStore,
    table: Table,
}

impl TableHandle<'_> {
    pub fn table(&self) -> Table {
        self.table
    }

    pub async fn count(&self) -> Result<u64> {
        let mut conn = self.store.pool.acquire().await?;
        ops::count(&mut conn, self.table).await
    }

    pub async fn count_active(&self) -> Result<u64> {
        let mut conn = self.store.pool.acquire().await?;
        ops::count_active(&mut conn, self.table).await
    }

    /// All records in insertion order, including inactive ones.
    pub async fn get_all(&self) -> Result<Vec<Record>> {
        let mut conn = self.store.pool.acquire().await?;
        ops::get_all(&mut conn, self.table).await
    }

    pub async fn get(&self, id: &str) -> Result<Option<Record>> {
        let mut conn = self.store.pool.acquire().await?;
        ops::get(&mut conn, self.table, id).await
    }

    /// Inserts `record` and returns its id.
    pub async fn add(&self, record: Record) -> Result<String> {
        let mut conn = self.store.pool.acquire().await?;
        ops::insert(&mut conn, self.table, &record).await?;
        Ok(record.id)
    }

    /// Merges `partial` into the record and returns the stored result.
    pub async fn update(&self, id: &str, partial: Map<String, Value>) -> Result<Record> {
        let mut conn = self.store.pool.acquire().await?;
        ops::update(&mut conn, self.table, id, partial).await
    }

    pub async fn remove(&self, id: &str, mode: RemoveMode) -> Result<()> {
        let mut conn = self.store.pool.acquire().await?;
        ops::remove(&mut conn, self.table, id, mode).await
    }

    /// Inserts all records or none; a key collision fails the whole call.
    pub async fn bulk_add(&self, records: &[Record]) -> Result<usize> {
        let mut conn = self.store.pool.acquire().await?;
        ops::bulk_insert(&mut conn, self.table, records).await
    }

    /// Physically removes every record in the table.
    pub async fn clear(&self) -> Result<u64> {
        let mut conn = self.store.pool.acquire().await?;
        ops::clear(&mut conn, self.table).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use serde_json::json;
    use tempfile::TempDir;

    struct TestContext {
        store: RecordStore,
        _temp_dir: TempDir, // Keep alive for duration of test
    }

    async fn setup_store() -> TestContext {
        let temp_dir = TempDir::new().unwrap();
        let store = RecordStore::open(&temp_dir.path().join("test.db"))
            .await
            .unwrap();
        TestContext {
            store,
            _temp_dir: temp_dir,
        }
    }

    fn partial(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[tokio::test]
    async fn test_add_and_get_record() {
        let ctx = setup_store().await;
        let customers = ctx.store.table(Table::Customers);

        let record = Record::new("main").with_field("name", "Acme");
        let id = customers.add(record.clone()).await.unwrap();
        assert_eq!(id, record.id);

        let fetched = customers.get(&id).await.unwrap().unwrap();
        assert_eq!(fetched, record);
        assert_eq!(customers.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_get_all_keeps_insertion_order() {
        let ctx = setup_store().await;
        let products = ctx.store.table(Table::Products);

        for id in ["z", "a", "m"] {
            products
                .add(Record::new("main").with_id(id))
                .await
                .unwrap();
        }

        let ids: Vec<String> = products
            .get_all()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["z", "a", "m"]);
    }

    #[tokio::test]
    async fn test_add_duplicate_id_is_key_conflict() {
        let ctx = setup_store().await;
        let orders = ctx.store.table(Table::Orders);

        orders.add(Record::new("main").with_id("o-1")).await.unwrap();
        let err = orders
            .add(Record::new("main").with_id("o-1"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            StoreError::KeyConflict { table: Table::Orders, ref id } if id == "o-1"
        ));
    }

    #[tokio::test]
    async fn test_add_rejects_empty_center() {
        let ctx = setup_store().await;

        let err = ctx
            .store
            .table(Table::Customers)
            .add(Record::new(""))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidRecord { .. }));
    }

    #[tokio::test]
    async fn test_same_id_allowed_in_different_tables() {
        let ctx = setup_store().await;

        ctx.store
            .table(Table::Orders)
            .add(Record::new("main").with_id("1"))
            .await
            .unwrap();
        ctx.store
            .table(Table::Invoices)
            .add(Record::new("main").with_id("1"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_update_merges_partial_fields() {
        let ctx = setup_store().await;
        let products = ctx.store.table(Table::Products);

        let id = products
            .add(
                Record::new("main")
                    .with_field("name", "Jug")
                    .with_field("price", 2),
            )
            .await
            .unwrap();

        let updated = products
            .update(&id, partial(json!({"price": 3})))
            .await
            .unwrap();
        assert_eq!(updated.field("price"), Some(&json!(3)));
        assert_eq!(updated.field("name"), Some(&json!("Jug")));

        let fetched = products.get(&id).await.unwrap().unwrap();
        assert_eq!(fetched, updated);
    }

    #[tokio::test]
    async fn test_update_missing_record_is_not_found() {
        let ctx = setup_store().await;

        let err = ctx
            .store
            .table(Table::Payments)
            .update("nope", partial(json!({"amount": 1})))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_update_rejects_id_change() {
        let ctx = setup_store().await;
        let payments = ctx.store.table(Table::Payments);

        let id = payments.add(Record::new("main")).await.unwrap();
        let err = payments
            .update(&id, partial(json!({"id": "other"})))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidRecord { .. }));
        assert!(payments.get(&id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_soft_remove_keeps_row() {
        let ctx = setup_store().await;
        let customers = ctx.store.table(Table::Customers);

        let id = customers.add(Record::new("main")).await.unwrap();
        customers.remove(&id, RemoveMode::Soft).await.unwrap();

        assert_eq!(customers.count().await.unwrap(), 1);
        assert_eq!(customers.count_active().await.unwrap(), 0);
        assert!(!customers.get(&id).await.unwrap().unwrap().is_active);
    }

    #[tokio::test]
    async fn test_hard_remove_deletes_row() {
        let ctx = setup_store().await;
        let customers = ctx.store.table(Table::Customers);

        let id = customers.add(Record::new("main")).await.unwrap();
        customers.remove(&id, RemoveMode::Hard).await.unwrap();

        assert_eq!(customers.count().await.unwrap(), 0);
        let err = customers.remove(&id, RemoveMode::Hard).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_bulk_add_is_all_or_nothing() {
        let ctx = setup_store().await;
        let invoices = ctx.store.table(Table::Invoices);

        invoices
            .add(Record::new("main").with_id("i-3"))
            .await
            .unwrap();

        let batch = vec![
            Record::new("main").with_id("i-1"),
            Record::new("main").with_id("i-2"),
            Record::new("main").with_id("i-3"),
        ];
        let err = invoices.bulk_add(&batch).await.unwrap_err();

        assert!(matches!(err, StoreError::KeyConflict { ref id, .. } if id == "i-3"));
        assert_eq!(invoices.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_bulk_add_and_clear() {
        let ctx = setup_store().await;
        let sheets = ctx.store.table(Table::TrackSheets);

        let batch: Vec<Record> = (0..5).map(|_| Record::new("main")).collect();
        assert_eq!(sheets.bulk_add(&batch).await.unwrap(), 5);
        assert_eq!(sheets.count().await.unwrap(), 5);

        assert_eq!(sheets.clear().await.unwrap(), 5);
        assert_eq!(sheets.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_transaction_commits_across_tables() {
        let ctx = setup_store().await;

        ctx.store
            .transaction(&[Table::Orders, Table::Invoices], |tx| {
                Box::pin(async move {
                    tx.add(Table::Orders, Record::new("main").with_id("o-1"))
                        .await?;
                    tx.add(Table::Invoices, Record::new("main").with_id("i-1"))
                        .await?;
                    Ok::<_, StoreError>(())
                })
            })
            .await
            .unwrap();

        assert_eq!(ctx.store.table(Table::Orders).count().await.unwrap(), 1);
        assert_eq!(ctx.store.table(Table::Invoices).count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_transaction_rolls_back_on_error() {
        let ctx = setup_store().await;
        ctx.store
            .table(Table::Customers)
            .bulk_add(&[Record::new("main"), Record::new("main")])
            .await
            .unwrap();

        let result: Result<()> = ctx
            .store
            .transaction(&[Table::Customers, Table::Products], |tx| {
                Box::pin(async move {
                    tx.clear(Table::Customers).await?;
                    tx.add(Table::Products, Record::new("main").with_id("dup"))
                        .await?;
                    tx.add(Table::Products, Record::new("main").with_id("dup"))
                        .await?;
                    Ok::<_, StoreError>(())
                })
            })
            .await;

        assert!(matches!(result, Err(StoreError::KeyConflict { .. })));
        assert_eq!(ctx.store.table(Table::Customers).count().await.unwrap(), 2);
        assert_eq!(ctx.store.table(Table::Products).count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_transaction_rejects_undeclared_table() {
        let ctx = setup_store().await;

        let result: Result<()> = ctx
            .store
            .transaction(&[Table::Orders], |tx| {
                Box::pin(async move {
                    tx.add(Table::Payments, Record::new("main")).await?;
                    Ok::<_, StoreError>(())
                })
            })
            .await;

        assert!(matches!(
            result,
            Err(StoreError::TableNotInTransaction(Table::Payments))
        ));
    }

    #[tokio::test]
    async fn test_dropped_guard_rolls_back() {
        let ctx = setup_store().await;

        {
            let mut tx = ctx.store.begin(&[Table::Orders]).await.unwrap();
            tx.add(Table::Orders, Record::new("main")).await.unwrap();
        }

        assert_eq!(ctx.store.table(Table::Orders).count().await.unwrap(), 0);
    }
}
