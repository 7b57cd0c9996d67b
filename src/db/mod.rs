mod ops;
mod record_store;
mod transaction;

pub use record_store::{RecordStore, RemoveMode, TableHandle};
pub use transaction::StoreTransaction;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

use crate::error::{Result, StoreError};

/// Open the database connection pool and run migrations.
///
/// Any failure here means the store is unavailable to the caller.
pub async fn init_db(path: &Path) -> Result<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Unavailable(sqlx::Error::Io(e)))?;
        }
    }

    let db_url = format!("sqlite:{}?mode=rwc", path.display());

    let options = SqliteConnectOptions::from_str(&db_url)
        .map_err(StoreError::Unavailable)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .map_err(StoreError::Unavailable)?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| StoreError::Unavailable(e.into()))?;

    tracing::debug!("Opened store at {}", path.display());
    Ok(pool)
}
