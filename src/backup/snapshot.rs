//! Snapshot file format.
//!
//! ```text
//! {
//!   "version": "1.0.0",
//!   "timestamp": "2025-01-01T09:30:00.000Z",
//!   "customers": [ { "id": "...", "centerId": "...", "isActive": true, ... } ],
//!   "products": [ ... ],
//!   "orders": [ ... ],
//!   "invoices": [ ... ],
//!   "payments": [ ... ],
//!   "trackSheets": [ ... ]
//! }
//! ```
//!
//! A table missing from a snapshot is left untouched on import. Keys that name
//! no known table are ignored and reported.

use chrono::{DateTime, SecondsFormat, Utc};
use semver::Version;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::{Result, StoreError};
use crate::models::{Record, Table};

const VERSION_KEY: &str = "version";
const TIMESTAMP_KEY: &str = "timestamp";

/// A full, versioned, timestamped copy of the store's tables.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub tables: BTreeMap<Table, Vec<Record>>,
}

/// A parsed snapshot plus the keys that were skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSnapshot {
    pub snapshot: Snapshot,
    pub ignored_tables: Vec<String>,
}

impl Snapshot {
    pub fn new(version: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            version: version.into(),
            timestamp,
            tables: BTreeMap::new(),
        }
    }

    pub fn with_table(mut self, table: Table, records: Vec<Record>) -> Self {
        self.tables.insert(table, records);
        self
    }

    /// Default download name, e.g. `ledgerbox-backup-2025-01-31.json`.
    pub fn file_name(&self) -> String {
        format!("ledgerbox-backup-{}.json", self.timestamp.format("%Y-%m-%d"))
    }

    pub fn record_count(&self) -> usize {
        self.tables.values().map(Vec::len).sum()
    }

    /// Row count each included table should have after a restore.
    pub fn expected_counts(&self) -> BTreeMap<Table, u64> {
        self.tables
            .iter()
            .map(|(table, records)| (*table, records.len() as u64))
            .collect()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses snapshot text without touching any store.
    pub fn parse(text: &str) -> Result<ParsedSnapshot> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| malformed(format!("not valid JSON: {}", e)))?;

        let Value::Object(mut map) = value else {
            return Err(malformed("expected a JSON object at the top level"));
        };

        let version = match map.remove(VERSION_KEY) {
            Some(Value::String(v)) => v,
            Some(_) => return Err(malformed("'version' must be a string")),
            None => return Err(malformed("missing 'version'")),
        };
        Version::parse(&version)
            .map_err(|e| malformed(format!("invalid version '{}': {}", version, e)))?;

        let timestamp = match map.remove(TIMESTAMP_KEY) {
            Some(Value::String(ts)) => DateTime::parse_from_rfc3339(&ts)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| malformed(format!("invalid timestamp '{}': {}", ts, e)))?,
            Some(_) => return Err(malformed("'timestamp' must be a string")),
            None => return Err(malformed("missing 'timestamp'")),
        };

        let mut tables = BTreeMap::new();
        let mut ignored_tables = Vec::new();

        for (key, value) in map {
            let Some(table) = Table::from_name(&key) else {
                ignored_tables.push(key);
                continue;
            };

            if !value.is_array() {
                return Err(malformed(format!("'{}' must be an array", key)));
            }
            let records: Vec<Record> = serde_json::from_value(value)
                .map_err(|e| malformed(format!("invalid record in '{}': {}", key, e)))?;

            for record in &records {
                record.validate().map_err(|reason| {
                    malformed(format!("invalid record in '{}': {}", key, reason))
                })?;
            }
            tables.insert(table, records);
        }

        Ok(ParsedSnapshot {
            snapshot: Snapshot {
                version,
                timestamp,
                tables,
            },
            ignored_tables,
        })
    }

    /// Rejects snapshots from a newer major data generation than `supported`.
    pub fn check_compatible(&self, supported: &str) -> Result<()> {
        let found = Version::parse(&self.version)
            .map_err(|e| malformed(format!("invalid version '{}': {}", self.version, e)))?;
        let supported_version = Version::parse(supported)
            .map_err(|_| StoreError::InvalidVersion(supported.to_string()))?;

        if found.major > supported_version.major {
            return Err(StoreError::UnsupportedSnapshotVersion {
                found: self.version.clone(),
                supported: supported.to_string(),
            });
        }
        Ok(())
    }
}

fn malformed(reason: impl Into<String>) -> StoreError {
    StoreError::MalformedSnapshot(reason.into())
}

impl Serialize for Snapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2 + self.tables.len()))?;
        map.serialize_entry(VERSION_KEY, &self.version)?;
        map.serialize_entry(
            TIMESTAMP_KEY,
            &self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
        )?;
        for (table, records) in &self.tables {
            map.serialize_entry(table.name(), records)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn sample_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 31, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_serialized_layout() {
        let snapshot = Snapshot::new("1.0.0", sample_time())
            .with_table(
                Table::Customers,
                vec![Record::new("main").with_id("c-1").with_field("name", "A")],
            )
            .with_table(Table::TrackSheets, Vec::new());

        let value: Value = serde_json::from_str(&snapshot.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "version": "1.0.0",
                "timestamp": "2025-01-31T09:30:00.000Z",
                "customers": [{"id": "c-1", "centerId": "main", "isActive": true, "name": "A"}],
                "trackSheets": []
            })
        );
    }

    #[test]
    fn test_key_order_follows_tables() {
        let snapshot = Snapshot::new("1.0.0", sample_time())
            .with_table(Table::TrackSheets, Vec::new())
            .with_table(Table::Customers, Vec::new());

        let text = snapshot.to_json().unwrap();
        let version_at = text.find("\"version\"").unwrap();
        let customers_at = text.find("\"customers\"").unwrap();
        let sheets_at = text.find("\"trackSheets\"").unwrap();
        assert!(version_at < customers_at && customers_at < sheets_at);
    }

    #[test]
    fn test_file_name_uses_date() {
        let snapshot = Snapshot::new("1.0.0", sample_time());
        assert_eq!(snapshot.file_name(), "ledgerbox-backup-2025-01-31.json");
    }

    #[test]
    fn test_parse_reads_tables_and_reports_unknown_keys() {
        let text = r#"{
            "version": "1.2.0",
            "timestamp": "2025-01-31T09:30:00.000Z",
            "orders": [{"id": 1, "centerId": "main", "total": 20}],
            "suppliers": [{"id": "s-1"}]
        }"#;

        let parsed = Snapshot::parse(text).unwrap();
        assert_eq!(parsed.snapshot.version, "1.2.0");
        assert_eq!(parsed.snapshot.timestamp, sample_time());
        assert_eq!(parsed.snapshot.tables.len(), 1);
        assert_eq!(parsed.snapshot.tables[&Table::Orders][0].id, "1");
        assert_eq!(parsed.ignored_tables, vec!["suppliers".to_string()]);
    }

    #[test]
    fn test_parse_rejects_non_json() {
        let err = Snapshot::parse("definitely not json").unwrap_err();
        assert!(matches!(err, StoreError::MalformedSnapshot(_)));
    }

    #[test]
    fn test_parse_rejects_missing_version_or_timestamp() {
        assert!(matches!(
            Snapshot::parse(r#"{"timestamp": "2025-01-31T09:30:00Z"}"#),
            Err(StoreError::MalformedSnapshot(_))
        ));
        assert!(matches!(
            Snapshot::parse(r#"{"version": "1.0.0"}"#),
            Err(StoreError::MalformedSnapshot(_))
        ));
        assert!(matches!(
            Snapshot::parse(r#"{"version": "1.0.0", "timestamp": "yesterday"}"#),
            Err(StoreError::MalformedSnapshot(_))
        ));
    }

    #[test]
    fn test_parse_rejects_bad_table_payloads() {
        let not_array = r#"{"version": "1.0.0", "timestamp": "2025-01-31T09:30:00Z", "products": {}}"#;
        assert!(matches!(
            Snapshot::parse(not_array),
            Err(StoreError::MalformedSnapshot(_))
        ));

        let missing_center =
            r#"{"version": "1.0.0", "timestamp": "2025-01-31T09:30:00Z", "products": [{"id": "p"}]}"#;
        assert!(matches!(
            Snapshot::parse(missing_center),
            Err(StoreError::MalformedSnapshot(_))
        ));

        let blank_id = r#"{"version": "1.0.0", "timestamp": "2025-01-31T09:30:00Z", "products": [{"id": "", "centerId": "main"}]}"#;
        assert!(matches!(
            Snapshot::parse(blank_id),
            Err(StoreError::MalformedSnapshot(_))
        ));
    }

    #[test]
    fn test_check_compatible() {
        let same_major = Snapshot::new("1.4.0", sample_time());
        assert!(same_major.check_compatible("1.0.0").is_ok());

        let older = Snapshot::new("0.3.0", sample_time());
        assert!(older.check_compatible("1.0.0").is_ok());

        let newer = Snapshot::new("2.0.0", sample_time());
        assert!(matches!(
            newer.check_compatible("1.0.0"),
            Err(StoreError::UnsupportedSnapshotVersion { .. })
        ));
    }

    #[test]
    fn test_expected_counts() {
        let snapshot = Snapshot::new("1.0.0", sample_time())
            .with_table(Table::Orders, vec![Record::new("main"), Record::new("main")])
            .with_table(Table::Payments, Vec::new());

        let expected = snapshot.expected_counts();
        assert_eq!(expected[&Table::Orders], 2);
        assert_eq!(expected[&Table::Payments], 0);
        assert_eq!(snapshot.record_count(), 2);
    }
}
