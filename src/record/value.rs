//! Field values

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Serialize, Serializer};
use serde_json::Value;
use uuid::Uuid;

use super::normalize::normalize_value;

/// A typed field value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Arbitrary precision number, kept in its decimal text form
    Decimal(String),
    Text(String),
    Uuid(Uuid),
    Timestamp(DateTime<Utc>),
    Date(NaiveDate),
    List(Vec<FieldValue>),
    /// Nested record-shaped value (embedded record or loaded relation)
    Map(BTreeMap<String, FieldValue>),
    /// Relation or field that was never loaded
    NotLoaded,
}

impl FieldValue {
    /// Build a decimal value, rejecting text that is not a plain decimal number
    pub fn decimal(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        let digits = text.strip_prefix('-').unwrap_or(&text);
        let mut parts = digits.splitn(2, '.');
        let int_part = parts.next().unwrap_or("");
        let frac_part = parts.next();

        let int_ok = !int_part.is_empty() && int_part.bytes().all(|b| b.is_ascii_digit());
        let frac_ok = frac_part.map_or(true, |f| !f.is_empty() && f.bytes().all(|b| b.is_ascii_digit()));

        (int_ok && frac_ok).then_some(Self::Decimal(text))
    }

    /// Whether this value is absent (null or never loaded)
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null | FieldValue::NotLoaded)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) | FieldValue::Decimal(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Type name for error messages and logs
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Bool(_) => "bool",
            FieldValue::Int(_) => "int",
            FieldValue::Float(_) => "float",
            FieldValue::Decimal(_) => "decimal",
            FieldValue::Text(_) => "string",
            FieldValue::Uuid(_) => "uuid",
            FieldValue::Timestamp(_) => "timestamp",
            FieldValue::Date(_) => "date",
            FieldValue::List(_) => "list",
            FieldValue::Map(_) => "map",
            FieldValue::NotLoaded => "not_loaded",
        }
    }

    /// Transport-safe JSON form of this value
    pub fn to_transport(&self) -> Value {
        normalize_value(self)
    }

    /// Compare two values, coercing across compatible representations.
    ///
    /// Numbers compare numerically across int/float/decimal. Text compares
    /// against uuids, timestamps, dates and bools through their canonical
    /// parse. Returns `None` when the values are not comparable; nulls are
    /// never comparable.
    pub fn compare(&self, other: &FieldValue) -> Option<Ordering> {
        use FieldValue as V;

        match (self, other) {
            (V::Bool(a), V::Bool(b)) => Some(a.cmp(b)),
            (V::Text(a), V::Text(b)) => Some(a.cmp(b)),
            (V::Uuid(a), V::Uuid(b)) => Some(a.cmp(b)),
            (V::Timestamp(a), V::Timestamp(b)) => Some(a.cmp(b)),
            (V::Date(a), V::Date(b)) => Some(a.cmp(b)),

            (V::Uuid(a), V::Text(b)) => uuid::Uuid::parse_str(b).ok().map(|b| a.cmp(&b)),
            (V::Text(a), V::Uuid(b)) => uuid::Uuid::parse_str(a).ok().map(|a| a.cmp(b)),
            (V::Timestamp(a), V::Text(b)) => parse_timestamp(b).map(|b| a.cmp(&b)),
            (V::Text(a), V::Timestamp(b)) => parse_timestamp(a).map(|a| a.cmp(b)),
            (V::Date(a), V::Text(b)) => parse_date(b).map(|b| a.cmp(&b)),
            (V::Text(a), V::Date(b)) => parse_date(a).map(|a| a.cmp(b)),
            (V::Bool(a), V::Text(b)) => parse_bool(b).map(|b| a.cmp(&b)),
            (V::Text(a), V::Bool(b)) => parse_bool(a).map(|a| a.cmp(b)),

            (V::Int(a), V::Int(b)) => Some(a.cmp(b)),
            (a, b) => match (a.as_number(), b.as_number()) {
                (Some(a), Some(b)) => a.partial_cmp(&b),
                _ => None,
            },
        }
    }

    /// Equality under the same coercions as [`FieldValue::compare`]
    pub fn loose_eq(&self, other: &FieldValue) -> bool {
        self.compare(other) == Some(Ordering::Equal)
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Int(i) => Some(*i as f64),
            FieldValue::Float(f) => Some(*f),
            FieldValue::Decimal(d) => d.parse().ok(),
            _ => None,
        }
    }
}

fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()
}

fn parse_bool(text: &str) -> Option<bool> {
    match text {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_transport() {
            Value::String(s) => write!(f, "{}", s),
            other => write!(f, "{}", other),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_transport().serialize(serializer)
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Int(i),
                None => n.as_f64().map_or(FieldValue::Null, FieldValue::Float),
            },
            Value::String(s) => FieldValue::Text(s),
            Value::Array(items) => FieldValue::List(items.into_iter().map(FieldValue::from).collect()),
            Value::Object(obj) => FieldValue::Map(
                obj.into_iter()
                    .map(|(k, v)| (k, FieldValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Int(i)
    }
}

impl From<i32> for FieldValue {
    fn from(i: i32) -> Self {
        FieldValue::Int(i64::from(i))
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        FieldValue::Float(f)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<Uuid> for FieldValue {
    fn from(u: Uuid) -> Self {
        FieldValue::Uuid(u)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(t: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(t)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(d: NaiveDate) -> Self {
        FieldValue::Date(d)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(FieldValue::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_numeric_compare_across_types() {
        assert_eq!(FieldValue::Int(2).compare(&FieldValue::Float(1.5)), Some(Ordering::Greater));
        assert!(FieldValue::Int(3).loose_eq(&FieldValue::Float(3.0)));
        assert!(FieldValue::Decimal("10.50".into()).loose_eq(&FieldValue::Float(10.5)));
    }

    #[test]
    fn test_text_coerces_to_uuid_and_timestamp() {
        let id = Uuid::new_v4();
        assert!(FieldValue::Uuid(id).loose_eq(&FieldValue::Text(id.to_string())));

        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        assert_eq!(
            FieldValue::Timestamp(at).compare(&FieldValue::from("2024-01-01T00:00:00Z")),
            Some(Ordering::Greater)
        );
    }

    #[test]
    fn test_null_is_not_comparable() {
        assert_eq!(FieldValue::Null.compare(&FieldValue::Null), None);
        assert_eq!(FieldValue::Int(1).compare(&FieldValue::from("1")), None);
    }

    #[test]
    fn test_decimal_constructor() {
        assert!(FieldValue::decimal("12.340").is_some());
        assert!(FieldValue::decimal("-3").is_some());
        assert!(FieldValue::decimal("1.").is_none());
        assert!(FieldValue::decimal("abc").is_none());
    }

    #[test]
    fn test_from_json_number() {
        assert_eq!(FieldValue::from(serde_json::json!(7)), FieldValue::Int(7));
        assert_eq!(FieldValue::from(serde_json::json!(7.25)), FieldValue::Float(7.25));
    }
}
