//! Error types for the local data store.

use std::path::PathBuf;

use thiserror::Error;

use crate::models::Table;

/// Errors surfaced by the record store and everything built on top of it.
///
/// None of these are retried internally; retrying is the caller's decision.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The database file could not be opened or migrated.
    #[error("Store unavailable: {0}")]
    Unavailable(#[source] sqlx::Error),

    /// Any other failure reported by the database.
    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),

    /// A write collided with an existing identifier.
    #[error("Key conflict in {table}: record '{id}' already exists")]
    KeyConflict { table: Table, id: String },

    #[error("Record '{id}' not found in {table}")]
    NotFound { table: Table, id: String },

    /// A record failed validation before reaching the database.
    #[error("Invalid record for {table}: {reason}")]
    InvalidRecord { table: Table, reason: String },

    /// A transaction tried to touch a table it did not declare.
    #[error("Table {0} is not part of this transaction")]
    TableNotInTransaction(Table),

    /// Import text is not a valid snapshot. Raised before any table is touched.
    #[error("Malformed snapshot: {0}")]
    MalformedSnapshot(String),

    #[error("Snapshot version {found} is newer than supported version {supported}")]
    UnsupportedSnapshotVersion { found: String, supported: String },

    /// Seeding a table failed; the version marker was not written.
    #[error("Seeding {table} failed: {source}")]
    PartialSeedFailure {
        table: Table,
        #[source]
        source: Box<StoreError>,
    },

    #[error("Invalid version '{0}'")]
    InvalidVersion(String),

    #[error("Version marker error at '{}': {source}", path.display())]
    VersionMarker {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A delivery collaborator (save or pick file) failed.
    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Connection-level failures mean the store cannot be reached.
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => {
                StoreError::Unavailable(err)
            }
            other => StoreError::Database(other),
        }
    }
}

impl StoreError {
    /// Maps a write error, turning unique-constraint violations into `KeyConflict`.
    pub(crate) fn from_write(err: sqlx::Error, table: Table, id: &str) -> Self {
        let is_conflict = err
            .as_database_error()
            .map(|db| db.is_unique_violation())
            .unwrap_or(false);

        if is_conflict {
            StoreError::KeyConflict {
                table,
                id: id.to_string(),
            }
        } else {
            err.into()
        }
    }
}
