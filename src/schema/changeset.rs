//! Changeset collaborator
//!
//! Turns raw attributes plus a base record (an empty template on create, the
//! existing row on update) into a record ready to persist, or field-keyed
//! validation messages. The engine never interprets these messages.

use crate::policy::Actor;
use crate::record::{Attrs, FieldErrors, Record};

use super::types::RecordSchema;

pub const MSG_INVALID: &str = "is invalid";
pub const MSG_BLANK: &str = "can't be blank";

/// Changeset collaborator contract
pub trait Changeset: Send + Sync {
    /// Apply `attrs` over `base`, returning the record to persist.
    fn cast(
        &self,
        schema: &RecordSchema,
        base: &Record,
        attrs: &Attrs,
        actor: Option<&Actor>,
    ) -> Result<Record, FieldErrors>;
}

/// Schema-driven changeset.
///
/// - Undeclared fields and the primary key are dropped
/// - Values are cast to the declared field type; failures are "is invalid"
/// - Required fields that end up missing or null are "can't be blank"
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaChangeset;

impl Changeset for SchemaChangeset {
    fn cast(
        &self,
        schema: &RecordSchema,
        base: &Record,
        attrs: &Attrs,
        _actor: Option<&Actor>,
    ) -> Result<Record, FieldErrors> {
        let mut record = base.clone();
        let mut errors = FieldErrors::new();

        for (name, raw) in attrs {
            if name == &schema.primary_key {
                continue;
            }
            let Some(def) = schema.field(name) else {
                continue;
            };

            match def.field_type.cast(raw) {
                Some(value) => {
                    record.set(name.clone(), value);
                }
                None => errors
                    .entry(name.clone())
                    .or_default()
                    .push(MSG_INVALID.to_string()),
            }
        }

        for (name, def) in &schema.fields {
            if !def.required || name == &schema.primary_key || errors.contains_key(name) {
                continue;
            }
            let present = record.get(name).map_or(false, |v| !v.is_null());
            if !present {
                errors
                    .entry(name.clone())
                    .or_default()
                    .push(MSG_BLANK.to_string());
            }
        }

        if errors.is_empty() {
            Ok(record)
        } else {
            Err(errors)
        }
    }
}
