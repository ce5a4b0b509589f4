//! # Record Model
//!
//! Typed field values and the records the engine moves between policies,
//! storage, triggers and broadcasts.
//!
//! A `Record` owns its values outright: cloning one produces an independent
//! deep copy, which is what before/after snapshots rely on.

mod normalize;
mod value;

pub use normalize::{attrs_to_transport, normalize_json};
pub use value::FieldValue;

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// Raw or rewritten attributes for a create/update, keyed by field name.
pub type Attrs = BTreeMap<String, FieldValue>;

/// Field-keyed validation messages (e.g. `{"title": ["can't be blank"]}`).
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// A single row of a resource.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field assignment
    pub fn with(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Get a field value
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Set a field value, returning the previous one
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Option<FieldValue> {
        self.fields.insert(field.into(), value.into())
    }

    /// Remove a field
    pub fn remove(&mut self, field: &str) -> Option<FieldValue> {
        self.fields.remove(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Iterate fields in name order
    pub fn fields(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Merge attributes over this record's fields
    pub fn merge(&mut self, attrs: &Attrs) {
        for (k, v) in attrs {
            self.fields.insert(k.clone(), v.clone());
        }
    }

    /// Build a record from a JSON object. Non-objects yield `None`.
    pub fn from_json(value: &Value) -> Option<Self> {
        value.as_object().map(|obj| {
            obj.iter()
                .map(|(k, v)| (k.clone(), FieldValue::from(v.clone())))
                .collect()
        })
    }

    /// Transport-safe JSON form of this record.
    ///
    /// Applies the same rules as job argument normalization: temporal values
    /// become ISO-8601 strings, decimals become decimal strings, nested
    /// records become plain objects, and not-loaded markers are dropped.
    pub fn to_transport(&self) -> Map<String, Value> {
        attrs_to_transport(&self.fields)
    }

    pub fn into_fields(self) -> BTreeMap<String, FieldValue> {
        self.fields
    }
}

impl FromIterator<(String, FieldValue)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

impl From<Attrs> for Record {
    fn from(fields: Attrs) -> Self {
        Self { fields }
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_transport().serialize(serializer)
    }
}

/// Convert a JSON object into attributes. Non-objects yield an empty set.
pub fn attrs_from_json(value: &Value) -> Attrs {
    value
        .as_object()
        .map(|obj| {
            obj.iter()
                .map(|(k, v)| (k.clone(), FieldValue::from(v.clone())))
                .collect()
        })
        .unwrap_or_default()
}
