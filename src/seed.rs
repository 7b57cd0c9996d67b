//! First-run seeding of reference data.

use serde::Serialize;

use crate::db::RecordStore;
use crate::error::{Result, StoreError};
use crate::models::{Customer, Entity, Product, Record, Table};
use crate::version::{ratchet_version, VersionStore, CURRENT_DATA_VERSION};

/// Whether a table needs its default rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedDecision {
    NeedsSeed,
    AlreadySeeded,
}

impl SeedDecision {
    pub fn from_count(count: u64) -> Self {
        if count == 0 {
            SeedDecision::NeedsSeed
        } else {
            SeedDecision::AlreadySeeded
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSeed {
    pub table: Table,
    pub decision: SeedDecision,
    pub inserted: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeedReport {
    pub tables: Vec<TableSeed>,
    /// Version written to the marker, if it moved.
    pub version_written: Option<String>,
}

impl SeedReport {
    pub fn inserted(&self) -> usize {
        self.tables.iter().map(|t| t.inserted).sum()
    }
}

pub fn default_customers(center_id: &str) -> Vec<Customer> {
    vec![
        Customer::new(center_id, "Walk-in Customer")
            .with_phone("000-000-0000")
            .with_address("Counter sale"),
        Customer::new(center_id, "Sample Retail Co.")
            .with_phone("555-0100")
            .with_address("12 Market Street")
            .with_balance(0.0),
    ]
}

pub fn default_products(center_id: &str) -> Vec<Product> {
    vec![
        Product::new(center_id, "Mineral Water 20L", 2.5)
            .with_unit("bottle")
            .with_stock(100),
        Product::new(center_id, "Mineral Water 1.5L (12 pack)", 4.0)
            .with_unit("pack")
            .with_stock(50),
        Product::new(center_id, "Dispenser Rental", 10.0).with_unit("month"),
        Product::new(center_id, "Bottle Deposit", 5.0).with_unit("bottle"),
    ]
}

/// Seeds every empty core table and records the current data version.
///
/// Customers and products are checked independently, so a store that already
/// has products only gets customers. A failed insert aborts initialization
/// before the version marker is written, so the next start retries.
pub async fn initialize_default_data<V: VersionStore>(
    store: &RecordStore,
    versions: &V,
    center_id: &str,
) -> Result<SeedReport> {
    let customers = seed_table(store, default_customers(center_id)).await?;
    let products = seed_table(store, default_products(center_id)).await?;

    let version_written = if ratchet_version(versions, CURRENT_DATA_VERSION).await? {
        Some(CURRENT_DATA_VERSION.to_string())
    } else {
        None
    };

    let report = SeedReport {
        tables: vec![customers, products],
        version_written,
    };

    if report.inserted() > 0 {
        tracing::info!("Seeded {} default record(s)", report.inserted());
    } else {
        tracing::debug!("Default data already present, nothing seeded");
    }
    Ok(report)
}

async fn seed_table<E: Entity>(store: &RecordStore, defaults: Vec<E>) -> Result<TableSeed> {
    let table = E::TABLE;
    let handle = store.table(table);
    let decision = SeedDecision::from_count(handle.count().await?);

    let inserted = match decision {
        SeedDecision::AlreadySeeded => 0,
        SeedDecision::NeedsSeed => {
            let records: Vec<Record> = defaults.into_iter().map(Entity::into_record).collect();
            handle
                .bulk_add(&records)
                .await
                .map_err(|e| StoreError::PartialSeedFailure {
                    table,
                    source: Box::new(e),
                })?
        }
    };

    tracing::debug!("Seed {}: {:?}, inserted {}", table, decision, inserted);
    Ok(TableSeed {
        table,
        decision,
        inserted,
    })
}
