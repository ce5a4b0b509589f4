//! # Storage Collaborator
//!
//! The engine never talks to a database directly. It hands a [`Queryable`]
//! (already scoped by policy and compiled from params) to a
//! [`StorageBackend`] and receives records back.

mod errors;
mod memory;

pub use errors::{StorageError, StorageResult};
pub use memory::{InMemoryStorage, StorageCalls, MSG_TAKEN};

use crate::query::Queryable;
use crate::record::Record;
use crate::schema::RecordSchema;

/// Storage collaborator contract
pub trait StorageBackend: Send + Sync {
    /// Rows matching every predicate, ordered and paged as requested
    fn query(&self, query: &Queryable) -> StorageResult<Vec<Record>>;

    /// Persist a new record, returning it with generated fields filled in
    fn insert(&self, schema: &RecordSchema, record: Record) -> StorageResult<Record>;

    /// Replace `existing` with `updated`, returning the persisted row
    fn update(&self, schema: &RecordSchema, existing: &Record, updated: Record) -> StorageResult<Record>;

    /// Remove `record`, returning the deleted row
    fn delete(&self, schema: &RecordSchema, record: &Record) -> StorageResult<Record>;
}
