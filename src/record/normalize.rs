//! Transport normalization
//!
//! Everything handed to the job queue, the pub/sub bus, or an adaptor's
//! serializer goes through these functions, so the output only ever contains
//! JSON scalars, arrays and plain objects.

use std::collections::BTreeMap;

use chrono::SecondsFormat;
use serde_json::{Map, Number, Value};

use super::value::FieldValue;

/// Normalize a single value.
///
/// A bare `NotLoaded` becomes `null`; inside lists and maps it is dropped.
pub(crate) fn normalize_value(value: &FieldValue) -> Value {
    match value {
        FieldValue::Null | FieldValue::NotLoaded => Value::Null,
        FieldValue::Bool(b) => Value::Bool(*b),
        FieldValue::Int(i) => Value::Number((*i).into()),
        FieldValue::Float(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
        FieldValue::Decimal(d) => Value::String(d.clone()),
        FieldValue::Text(s) => Value::String(s.clone()),
        FieldValue::Uuid(u) => Value::String(u.to_string()),
        FieldValue::Timestamp(t) => Value::String(t.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        FieldValue::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
        FieldValue::List(items) => Value::Array(
            items
                .iter()
                .filter(|v| !matches!(v, FieldValue::NotLoaded))
                .map(normalize_value)
                .collect(),
        ),
        FieldValue::Map(fields) => Value::Object(attrs_to_transport(fields)),
    }
}

/// Normalize a field map, dropping not-loaded entries.
pub fn attrs_to_transport(fields: &BTreeMap<String, FieldValue>) -> Map<String, Value> {
    fields
        .iter()
        .filter(|(_, v)| !matches!(v, FieldValue::NotLoaded))
        .map(|(k, v)| (k.clone(), normalize_value(v)))
        .collect()
}

/// Normalize an already-JSON value.
///
/// Used for static argument maps and dispatch options, which are declared as
/// JSON and only need their nested structure preserved.
pub fn normalize_json(value: &Value) -> Value {
    normalize_value(&FieldValue::from(value.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn test_temporal_values_become_iso8601() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 8, 30, 0).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();

        assert_eq!(normalize_value(&FieldValue::Timestamp(at)), json!("2024-03-09T08:30:00Z"));
        assert_eq!(normalize_value(&FieldValue::Date(date)), json!("2024-03-09"));
    }

    #[test]
    fn test_decimal_becomes_string() {
        let value = FieldValue::decimal("19.990").unwrap();
        assert_eq!(normalize_value(&value), json!("19.990"));
    }

    #[test]
    fn test_nested_maps_flatten_and_drop_not_loaded() {
        let mut author = BTreeMap::new();
        author.insert("id".to_string(), FieldValue::Int(4));
        author.insert("posts".to_string(), FieldValue::NotLoaded);

        let mut fields = BTreeMap::new();
        fields.insert("author".to_string(), FieldValue::Map(author));
        fields.insert("comments".to_string(), FieldValue::NotLoaded);
        fields.insert(
            "tags".to_string(),
            FieldValue::List(vec!["a".into(), FieldValue::NotLoaded]),
        );

        let out = Value::Object(attrs_to_transport(&fields));

        assert_eq!(out, json!({"author": {"id": 4}, "tags": ["a"]}));
    }

    #[test]
    fn test_non_finite_float_becomes_null() {
        assert_eq!(normalize_value(&FieldValue::Float(f64::NAN)), Value::Null);
    }
}
