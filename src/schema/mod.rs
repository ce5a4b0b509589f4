//! Record schemas and the changeset collaborator
//!
//! A schema declares the fields of a resource's backing record type. It is
//! the source of truth for which fields a client may filter or order on, how
//! identifiers are cast, and how raw attributes are cast before persisting.

mod changeset;
mod types;

pub use changeset::{Changeset, SchemaChangeset, MSG_BLANK, MSG_INVALID};
pub use types::{FieldDef, FieldType, RecordSchema};
