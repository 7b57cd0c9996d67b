use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

/// One row of domain data in one table.
///
/// Serializes as a flat mapping: `id`, `centerId`, `isActive`, then the
/// domain fields of the entity kind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub center_id: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Keys that belong to the envelope and may not appear among domain fields.
pub const RESERVED_KEYS: [&str; 3] = ["id", "centerId", "isActive"];

fn default_active() -> bool {
    true
}

/// Accepts `"42"` and `42` alike; integer keys become their decimal string.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, found {}",
            other
        ))),
    }
}

impl Record {
    /// Creates an active record with a fresh store-assigned id.
    pub fn new(center_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            center_id: center_id.into(),
            is_active: true,
            fields: Map::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn with_fields(mut self, fields: Map<String, Value>) -> Self {
        self.fields.extend(fields);
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Checks the invariants every stored record must hold.
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("id cannot be empty".to_string());
        }
        if self.center_id.trim().is_empty() {
            return Err("centerId cannot be empty".to_string());
        }
        if let Some(key) = RESERVED_KEYS.iter().find(|k| self.fields.contains_key(**k)) {
            return Err(format!("'{}' is reserved and cannot be a field", key));
        }
        Ok(())
    }

    /// Merges a partial field mapping into this record.
    ///
    /// `centerId` and `isActive` update the envelope; `id` may only be repeated
    /// unchanged. A `null` domain value is stored as `null`, not removed.
    pub fn apply(&mut self, partial: Map<String, Value>) -> Result<(), String> {
        for (key, value) in partial {
            match key.as_str() {
                "id" => {
                    let same = match &value {
                        Value::String(s) => *s == self.id,
                        Value::Number(n) => n.to_string() == self.id,
                        _ => false,
                    };
                    if !same {
                        return Err("id cannot be changed".to_string());
                    }
                }
                "centerId" => match value {
                    Value::String(s) if !s.trim().is_empty() => self.center_id = s,
                    _ => return Err("centerId must be a non-empty string".to_string()),
                },
                "isActive" => match value {
                    Value::Bool(b) => self.is_active = b,
                    _ => return Err("isActive must be a boolean".to_string()),
                },
                _ => {
                    self.fields.insert(key, value);
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.id)?;
        writeln!(f, "{}", "=".repeat(self.id.len()))?;
        writeln!(f, "Center: {}", self.center_id)?;
        writeln!(f, "Active: {}", if self.is_active { "yes" } else { "no" })?;

        if !self.fields.is_empty() {
            writeln!(f, "\nFields:")?;
            for (key, value) in &self.fields {
                match value {
                    Value::String(s) => writeln!(f, "  {}: {}", key, s)?,
                    other => writeln!(f, "  {}: {}", key, other)?,
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_new() {
        let record = Record::new("main");
        assert_eq!(record.center_id, "main");
        assert!(record.is_active);
        assert!(record.fields.is_empty());
        assert!(Uuid::parse_str(&record.id).is_ok());
    }

    #[test]
    fn test_record_serializes_flat() {
        let record = Record::new("main")
            .with_id("c-1")
            .with_field("name", "Acme")
            .with_field("balance", 12.5);

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({"id": "c-1", "centerId": "main", "isActive": true, "name": "Acme", "balance": 12.5})
        );
    }

    #[test]
    fn test_record_deserializes_integer_id_and_default_active() {
        let record: Record =
            serde_json::from_value(json!({"id": 7, "centerId": "north", "qty": 3})).unwrap();
        assert_eq!(record.id, "7");
        assert!(record.is_active);
        assert_eq!(record.field("qty"), Some(&json!(3)));
        assert!(record.field("id").is_none());
    }

    #[test]
    fn test_record_missing_center_fails() {
        let result: Result<Record, _> = serde_json::from_value(json!({"id": "x"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_blank_center() {
        let record = Record::new("  ");
        assert!(record.validate().is_err());
        assert!(Record::new("main").validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_reserved_field_keys() {
        for key in RESERVED_KEYS {
            let record = Record::new("main").with_field(key, "x");
            let err = record.validate().unwrap_err();
            assert!(err.contains(key));
        }
        assert!(Record::new("main").with_field("name", "x").validate().is_ok());
    }

    #[test]
    fn test_apply_merges_fields_and_envelope() {
        let mut record = Record::new("main").with_id("p-1").with_field("price", 10);
        let partial = json!({"price": 12, "name": "Jug", "isActive": false, "centerId": "east"});
        let Value::Object(partial) = partial else {
            unreachable!()
        };

        record.apply(partial).unwrap();
        assert_eq!(record.field("price"), Some(&json!(12)));
        assert_eq!(record.field("name"), Some(&json!("Jug")));
        assert!(!record.is_active);
        assert_eq!(record.center_id, "east");
    }

    #[test]
    fn test_apply_rejects_id_change() {
        let mut record = Record::new("main").with_id("p-1");
        let mut partial = Map::new();
        partial.insert("id".to_string(), json!("p-2"));
        assert!(record.apply(partial).is_err());

        let mut same = Map::new();
        same.insert("id".to_string(), json!("p-1"));
        assert!(record.apply(same).is_ok());
    }

    #[test]
    fn test_record_display() {
        let record = Record::new("main").with_id("c-9").with_field("name", "Walk-in");
        let output = format!("{}", record);
        assert!(output.contains("c-9"));
        assert!(output.contains("Center: main"));
        assert!(output.contains("name: Walk-in"));
    }
}
