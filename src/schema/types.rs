//! Record schema type definitions
//!
//! Supported field types:
//! - string, int, float, bool
//! - decimal: arbitrary precision, kept as decimal text
//! - uuid, timestamp (UTC), date
//! - map: nested record-shaped value
//! - list: sequence of values

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::record::FieldValue;

/// Supported field types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Int,
    Float,
    Bool,
    Decimal,
    Uuid,
    Timestamp,
    Date,
    Map,
    List,
}

impl FieldType {
    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Int => "int",
            FieldType::Float => "float",
            FieldType::Bool => "bool",
            FieldType::Decimal => "decimal",
            FieldType::Uuid => "uuid",
            FieldType::Timestamp => "timestamp",
            FieldType::Date => "date",
            FieldType::Map => "map",
            FieldType::List => "list",
        }
    }

    /// Cast a raw value to this type.
    ///
    /// Null always casts to null; whether null is acceptable is a separate
    /// required-field check. Text is parsed into the declared type where a
    /// canonical text form exists. Returns `None` when the value cannot
    /// represent this type.
    pub fn cast(&self, value: &FieldValue) -> Option<FieldValue> {
        if value.is_null() {
            return Some(FieldValue::Null);
        }

        match (self, value) {
            (FieldType::String, FieldValue::Text(_)) => Some(value.clone()),

            (FieldType::Int, FieldValue::Int(_)) => Some(value.clone()),
            (FieldType::Int, FieldValue::Text(s)) => s.trim().parse().ok().map(FieldValue::Int),

            (FieldType::Float, FieldValue::Float(_)) => Some(value.clone()),
            (FieldType::Float, FieldValue::Int(i)) => Some(FieldValue::Float(*i as f64)),
            (FieldType::Float, FieldValue::Text(s)) => s.trim().parse().ok().map(FieldValue::Float),

            (FieldType::Bool, FieldValue::Bool(_)) => Some(value.clone()),
            (FieldType::Bool, FieldValue::Text(s)) => match s.as_str() {
                "true" => Some(FieldValue::Bool(true)),
                "false" => Some(FieldValue::Bool(false)),
                _ => None,
            },

            (FieldType::Decimal, FieldValue::Decimal(_)) => Some(value.clone()),
            (FieldType::Decimal, FieldValue::Int(i)) => FieldValue::decimal(i.to_string()),
            (FieldType::Decimal, FieldValue::Float(f)) => FieldValue::decimal(f.to_string()),
            (FieldType::Decimal, FieldValue::Text(s)) => FieldValue::decimal(s.trim()),

            (FieldType::Uuid, FieldValue::Uuid(_)) => Some(value.clone()),
            (FieldType::Uuid, FieldValue::Text(s)) => uuid::Uuid::parse_str(s).ok().map(FieldValue::Uuid),

            (FieldType::Timestamp, FieldValue::Timestamp(_)) => Some(value.clone()),
            (FieldType::Timestamp, FieldValue::Text(s)) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|t| FieldValue::Timestamp(t.with_timezone(&Utc))),

            (FieldType::Date, FieldValue::Date(_)) => Some(value.clone()),
            (FieldType::Date, FieldValue::Text(s)) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .map(FieldValue::Date),

            (FieldType::Map, FieldValue::Map(_)) => Some(value.clone()),
            (FieldType::List, FieldValue::List(_)) => Some(value.clone()),

            _ => None,
        }
    }
}

/// Field definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field data type
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Whether the field must be present and non-null
    #[serde(default)]
    pub required: bool,
    /// Whether storage enforces uniqueness for this field
    #[serde(default)]
    pub unique: bool,
}

impl FieldDef {
    /// Create a required field
    pub fn required(field_type: FieldType) -> Self {
        Self {
            field_type,
            required: true,
            unique: false,
        }
    }

    /// Create an optional field
    pub fn optional(field_type: FieldType) -> Self {
        Self {
            field_type,
            required: false,
            unique: false,
        }
    }

    /// Mark the field as unique
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

/// Declared shape of a resource's backing record type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSchema {
    /// Record type name (also the storage source name)
    pub name: String,
    /// Primary key field name
    pub primary_key: String,
    /// Field definitions, including the primary key
    pub fields: BTreeMap<String, FieldDef>,
}

impl RecordSchema {
    /// Create a schema with an integer `id` primary key
    pub fn new(name: impl Into<String>) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert("id".to_string(), FieldDef::optional(FieldType::Int));

        Self {
            name: name.into(),
            primary_key: "id".to_string(),
            fields,
        }
    }

    /// Replace the primary key
    pub fn with_primary_key(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.fields.remove(&self.primary_key);
        self.primary_key = name.into();
        self.fields
            .insert(self.primary_key.clone(), FieldDef::optional(field_type));
        self
    }

    /// Declare a field
    pub fn with_field(mut self, name: impl Into<String>, def: FieldDef) -> Self {
        self.fields.insert(name.into(), def);
        self
    }

    /// Whether the record type declares this field
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.get(name)
    }

    /// Declared type of the primary key
    pub fn primary_key_type(&self) -> FieldType {
        self.fields
            .get(&self.primary_key)
            .map(|def| def.field_type)
            .unwrap_or(FieldType::Int)
    }

    /// Cast a raw identifier to the primary key's declared type.
    ///
    /// UUID-shaped identifiers (containing a hyphen, or 32+ hex characters)
    /// stay opaque strings. Integer keys that fail to parse become `-1`, which
    /// matches no row.
    pub fn cast_id(&self, raw: &str) -> FieldValue {
        if looks_like_uuid(raw) {
            return FieldValue::Text(raw.to_string());
        }

        match self.primary_key_type() {
            FieldType::Int => FieldValue::Int(raw.trim().parse().unwrap_or(-1)),
            _ => FieldValue::Text(raw.to_string()),
        }
    }
}

fn looks_like_uuid(raw: &str) -> bool {
    raw.contains('-') || (raw.len() >= 32 && raw.bytes().all(|b| b.is_ascii_hexdigit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn posts() -> RecordSchema {
        RecordSchema::new("posts")
            .with_field("title", FieldDef::required(FieldType::String))
            .with_field("user_id", FieldDef::optional(FieldType::Int))
    }

    #[test]
    fn test_default_primary_key() {
        let schema = posts();
        assert_eq!(schema.primary_key, "id");
        assert_eq!(schema.primary_key_type(), FieldType::Int);
        assert!(schema.has_field("id"));
    }

    #[test]
    fn test_cast_integer_id() {
        let schema = posts();
        assert_eq!(schema.cast_id("42"), FieldValue::Int(42));
        assert_eq!(schema.cast_id("abc"), FieldValue::Int(-1));
    }

    #[test]
    fn test_cast_uuid_shaped_id_stays_opaque() {
        let schema = posts();
        let raw = "6f1c2a4e-1d2b-4c3d-9e8f-0a1b2c3d4e5f";
        assert_eq!(schema.cast_id(raw), FieldValue::Text(raw.to_string()));

        let hex = "0123456789abcdef0123456789abcdef";
        assert_eq!(schema.cast_id(hex), FieldValue::Text(hex.to_string()));
    }

    #[test]
    fn test_custom_primary_key() {
        let schema = RecordSchema::new("users").with_primary_key("uid", FieldType::Uuid);
        assert!(!schema.has_field("id"));
        assert_eq!(schema.primary_key_type(), FieldType::Uuid);
        assert_eq!(schema.cast_id("alice"), FieldValue::Text("alice".to_string()));
    }

    #[test]
    fn test_field_type_cast() {
        assert_eq!(FieldType::Int.cast(&"12".into()), Some(FieldValue::Int(12)));
        assert_eq!(FieldType::Int.cast(&"twelve".into()), None);
        assert_eq!(FieldType::Float.cast(&FieldValue::Int(2)), Some(FieldValue::Float(2.0)));
        assert_eq!(FieldType::String.cast(&FieldValue::Int(2)), None);
        assert_eq!(FieldType::Bool.cast(&FieldValue::Null), Some(FieldValue::Null));
        assert!(matches!(
            FieldType::Timestamp.cast(&"2024-01-01T00:00:00Z".into()),
            Some(FieldValue::Timestamp(_))
        ));
    }
}
