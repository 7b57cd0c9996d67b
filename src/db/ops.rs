//! SQL shared by plain table handles and transactions.
//!
//! Table names come from the fixed `Table` enum, so formatting them into
//! statements is safe.

use serde_json::{Map, Value};
use sqlx::{Connection, SqliteConnection};

use super::RemoveMode;
use crate::error::{Result, StoreError};
use crate::models::{Record, Table};

#[derive(sqlx::FromRow)]
struct RecordRow {
    id: String,
    center_id: String,
    is_active: bool,
    fields: String,
}

impl RecordRow {
    fn into_record(self) -> Result<Record> {
        let fields: Map<String, Value> = serde_json::from_str(&self.fields)?;
        Ok(Record {
            id: self.id,
            center_id: self.center_id,
            is_active: self.is_active,
            fields,
        })
    }
}

pub(crate) async fn count(conn: &mut SqliteConnection, table: Table) -> Result<u64> {
    let sql = format!("SELECT COUNT(*) FROM {}", table.sql_name());
    let count: i64 = sqlx::query_scalar(&sql).fetch_one(&mut *conn).await?;
    Ok(count as u64)
}

pub(crate) async fn count_active(conn: &mut SqliteConnection, table: Table) -> Result<u64> {
    let sql = format!(
        "SELECT COUNT(*) FROM {} WHERE is_active = 1",
        table.sql_name()
    );
    let count: i64 = sqlx::query_scalar(&sql).fetch_one(&mut *conn).await?;
    Ok(count as u64)
}

pub(crate) async fn get_all(conn: &mut SqliteConnection, table: Table) -> Result<Vec<Record>> {
    let sql = format!(
        "SELECT id, center_id, is_active, fields FROM {} ORDER BY rowid",
        table.sql_name()
    );
    let rows: Vec<RecordRow> = sqlx::query_as(&sql).fetch_all(&mut *conn).await?;

    rows.into_iter().map(RecordRow::into_record).collect()
}

pub(crate) async fn get(
    conn: &mut SqliteConnection,
    table: Table,
    id: &str,
) -> Result<Option<Record>> {
    let sql = format!(
        "SELECT id, center_id, is_active, fields FROM {} WHERE id = ?",
        table.sql_name()
    );
    let row: Option<RecordRow> = sqlx::query_as(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    row.map(RecordRow::into_record).transpose()
}

pub(crate) async fn insert(conn: &mut SqliteConnection, table: Table, record: &Record) -> Result<()> {
    record
        .validate()
        .map_err(|reason| StoreError::InvalidRecord { table, reason })?;

    let fields = serde_json::to_string(&record.fields)?;
    let sql = format!(
        "INSERT INTO {} (id, center_id, is_active, fields) VALUES (?, ?, ?, ?)",
        table.sql_name()
    );

    sqlx::query(&sql)
        .bind(&record.id)
        .bind(&record.center_id)
        .bind(record.is_active)
        .bind(&fields)
        .execute(&mut *conn)
        .await
        .map_err(|e| StoreError::from_write(e, table, &record.id))?;
    Ok(())
}

/// Inserts every record or none of them.
///
/// Runs inside its own transaction, or a savepoint when `conn` is already
/// inside one.
pub(crate) async fn bulk_insert(
    conn: &mut SqliteConnection,
    table: Table,
    records: &[Record],
) -> Result<usize> {
    let mut tx = conn.begin().await?;
    for record in records {
        insert(&mut tx, table, record).await?;
    }
    tx.commit().await?;
    Ok(records.len())
}

pub(crate) async fn update(
    conn: &mut SqliteConnection,
    table: Table,
    id: &str,
    partial: Map<String, Value>,
) -> Result<Record> {
    let mut tx = conn.begin().await?;

    let mut record = get(&mut tx, table, id)
        .await?
        .ok_or_else(|| StoreError::NotFound {
            table,
            id: id.to_string(),
        })?;

    record
        .apply(partial)
        .map_err(|reason| StoreError::InvalidRecord { table, reason })?;

    let fields = serde_json::to_string(&record.fields)?;
    let sql = format!(
        "UPDATE {} SET center_id = ?, is_active = ?, fields = ? WHERE id = ?",
        table.sql_name()
    );
    sqlx::query(&sql)
        .bind(&record.center_id)
        .bind(record.is_active)
        .bind(&fields)
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(record)
}

pub(crate) async fn remove(
    conn: &mut SqliteConnection,
    table: Table,
    id: &str,
    mode: RemoveMode,
) -> Result<()> {
    let sql = match mode {
        RemoveMode::Soft => format!("UPDATE {} SET is_active = 0 WHERE id = ?", table.sql_name()),
        RemoveMode::Hard => format!("DELETE FROM {} WHERE id = ?", table.sql_name()),
    };

    let result = sqlx::query(&sql).bind(id).execute(&mut *conn).await?;
    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound {
            table,
            id: id.to_string(),
        });
    }
    Ok(())
}

pub(crate) async fn clear(conn: &mut SqliteConnection, table: Table) -> Result<u64> {
    let sql = format!("DELETE FROM {}", table.sql_name());
    let result = sqlx::query(&sql).execute(&mut *conn).await?;
    Ok(result.rows_affected())
}
