//! Ledgerbox
//!
//! Offline-first local data store: per-entity record tables, first-run
//! seeding, a version marker, row count diagnostics and whole-store
//! backup and restore.

pub mod audit;
pub mod backup;
pub mod db;
pub mod error;
pub mod models;
pub mod seed;
pub mod service;
pub mod version;

pub use audit::{check_data_integrity, table_stats, CountMismatch, IntegrityReport, TableStats};
pub use backup::{
    export_all_data, import_all_data, BackupSink, BackupSource, ExportSummary, FileSink,
    FileSource, ImportPhase, ImportSummary, Importer, MemorySink, MemorySource, Snapshot,
};
pub use db::{RecordStore, RemoveMode, StoreTransaction, TableHandle};
pub use error::{Result, StoreError};
pub use models::{Customer, Entity, Product, Record, Table};
pub use seed::{initialize_default_data, SeedDecision, SeedReport};
pub use service::{DataService, OperationResult};
pub use version::{
    ratchet_version, FileVersionStore, MemoryVersionStore, VersionStore, CURRENT_DATA_VERSION,
};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
