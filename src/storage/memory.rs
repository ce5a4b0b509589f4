//! In-memory storage backend
//!
//! Interprets a [`Queryable`] directly against rows held in memory. Used by
//! tests and by embedders that want the engine without a database.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::RwLock;

use uuid::Uuid;

use crate::query::{Direction, OrderBy, Queryable};
use crate::record::{FieldErrors, FieldValue, Record};
use crate::schema::{FieldType, RecordSchema};

use super::errors::{StorageError, StorageResult};
use super::StorageBackend;

pub const MSG_TAKEN: &str = "has already been taken";

/// Snapshot of how often each storage operation was called
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StorageCalls {
    pub queries: usize,
    pub inserts: usize,
    pub updates: usize,
    pub deletes: usize,
}

impl StorageCalls {
    pub fn total(&self) -> usize {
        self.queries + self.inserts + self.updates + self.deletes
    }

    pub fn mutations(&self) -> usize {
        self.inserts + self.updates + self.deletes
    }
}

#[derive(Debug, Default)]
struct Table {
    rows: Vec<Record>,
    next_id: i64,
}

impl Table {
    fn observe_id(&mut self, value: Option<&FieldValue>) {
        if let Some(id) = value.and_then(FieldValue::as_i64) {
            self.next_id = self.next_id.max(id);
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    queries: AtomicUsize,
    inserts: AtomicUsize,
    updates: AtomicUsize,
    deletes: AtomicUsize,
}

/// In-memory storage
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    tables: RwLock<HashMap<String, Table>>,
    counters: Counters,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load rows without going through `insert` or touching the call counters
    pub fn seed(&self, schema: &RecordSchema, rows: impl IntoIterator<Item = Record>) -> StorageResult<()> {
        let mut tables = self.tables.write().map_err(|_| StorageError::lock_poisoned())?;
        let table = tables.entry(schema.name.clone()).or_default();

        for row in rows {
            table.observe_id(row.get(&schema.primary_key));
            table.rows.push(row);
        }
        Ok(())
    }

    /// All rows currently held for a source, in insertion order
    pub fn rows(&self, source: &str) -> Vec<Record> {
        self.tables
            .read()
            .ok()
            .and_then(|tables| tables.get(source).map(|t| t.rows.clone()))
            .unwrap_or_default()
    }

    pub fn calls(&self) -> StorageCalls {
        StorageCalls {
            queries: self.counters.queries.load(AtomicOrdering::SeqCst),
            inserts: self.counters.inserts.load(AtomicOrdering::SeqCst),
            updates: self.counters.updates.load(AtomicOrdering::SeqCst),
            deletes: self.counters.deletes.load(AtomicOrdering::SeqCst),
        }
    }

    fn check_unique(schema: &RecordSchema, rows: &[Record], candidate: &Record, skip: Option<&FieldValue>) -> StorageResult<()> {
        let mut errors = FieldErrors::new();

        for (name, def) in schema.fields.iter().filter(|(_, d)| d.unique) {
            let Some(value) = candidate.get(name).filter(|v| !v.is_null()) else {
                continue;
            };

            let taken = rows
                .iter()
                .filter(|row| skip.map_or(true, |pk| !same_pk(row, &schema.primary_key, pk)))
                .any(|row| row.get(name).map_or(false, |v| v.loose_eq(value)));

            if taken {
                errors.entry(name.clone()).or_default().push(MSG_TAKEN.to_string());
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(StorageError::Validation(errors))
        }
    }
}

fn same_pk(row: &Record, primary_key: &str, pk: &FieldValue) -> bool {
    row.get(primary_key).map_or(false, |v| v.loose_eq(pk))
}

/// Null sorts before any value; incomparable values keep their relative order
fn compare_field(a: Option<&FieldValue>, b: Option<&FieldValue>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());

    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => a.compare(b).unwrap_or(Ordering::Equal),
    }
}

fn sort_rows(rows: &mut [Record], order: &[OrderBy]) {
    if order.is_empty() {
        return;
    }

    rows.sort_by(|a, b| {
        order
            .iter()
            .map(|clause| {
                let ord = compare_field(a.get(&clause.field), b.get(&clause.field));
                match clause.direction {
                    Direction::Asc => ord,
                    Direction::Desc => ord.reverse(),
                }
            })
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });
}

impl StorageBackend for InMemoryStorage {
    fn query(&self, query: &Queryable) -> StorageResult<Vec<Record>> {
        self.counters.queries.fetch_add(1, AtomicOrdering::SeqCst);

        if query.is_never() {
            return Ok(Vec::new());
        }

        let tables = self.tables.read().map_err(|_| StorageError::lock_poisoned())?;
        let Some(table) = tables.get(&query.source) else {
            return Ok(Vec::new());
        };

        let mut rows: Vec<Record> = table.rows.iter().filter(|r| query.matches(r)).cloned().collect();
        sort_rows(&mut rows, &query.order);

        let rows = rows
            .into_iter()
            .skip(query.offset)
            .take(query.limit.unwrap_or(usize::MAX))
            .collect();

        Ok(rows)
    }

    fn insert(&self, schema: &RecordSchema, mut record: Record) -> StorageResult<Record> {
        self.counters.inserts.fetch_add(1, AtomicOrdering::SeqCst);

        let mut tables = self.tables.write().map_err(|_| StorageError::lock_poisoned())?;
        let table = tables.entry(schema.name.clone()).or_default();

        Self::check_unique(schema, &table.rows, &record, None)?;

        let pk = &schema.primary_key;
        match record.get(pk).filter(|v| !v.is_null()).cloned() {
            Some(id) if table.rows.iter().any(|row| same_pk(row, pk, &id)) => {
                return Err(StorageError::field(pk.clone(), MSG_TAKEN));
            }
            Some(_) => {}
            None => {
                let id = match schema.primary_key_type() {
                    FieldType::Int => FieldValue::Int(table.next_id + 1),
                    FieldType::Uuid => FieldValue::Uuid(Uuid::new_v4()),
                    _ => FieldValue::Text(Uuid::new_v4().to_string()),
                };
                record.set(pk.clone(), id);
            }
        }

        table.observe_id(record.get(pk));
        table.rows.push(record.clone());
        Ok(record)
    }

    fn update(&self, schema: &RecordSchema, existing: &Record, mut updated: Record) -> StorageResult<Record> {
        self.counters.updates.fetch_add(1, AtomicOrdering::SeqCst);

        let pk_value = existing
            .get(&schema.primary_key)
            .cloned()
            .ok_or_else(|| StorageError::Missing(schema.name.clone()))?;

        let mut tables = self.tables.write().map_err(|_| StorageError::lock_poisoned())?;
        let table = tables
            .get_mut(&schema.name)
            .ok_or_else(|| StorageError::Missing(schema.name.clone()))?;

        Self::check_unique(schema, &table.rows, &updated, Some(&pk_value))?;

        let row = table
            .rows
            .iter_mut()
            .find(|row| same_pk(row, &schema.primary_key, &pk_value))
            .ok_or_else(|| StorageError::Missing(schema.name.clone()))?;

        // primary keys are immutable
        updated.set(schema.primary_key.clone(), pk_value);
        *row = updated.clone();
        Ok(updated)
    }

    fn delete(&self, schema: &RecordSchema, record: &Record) -> StorageResult<Record> {
        self.counters.deletes.fetch_add(1, AtomicOrdering::SeqCst);

        let pk_value = record
            .get(&schema.primary_key)
            .ok_or_else(|| StorageError::Missing(schema.name.clone()))?;

        let mut tables = self.tables.write().map_err(|_| StorageError::lock_poisoned())?;
        let table = tables
            .get_mut(&schema.name)
            .ok_or_else(|| StorageError::Missing(schema.name.clone()))?;

        let index = table
            .rows
            .iter()
            .position(|row| same_pk(row, &schema.primary_key, pk_value))
            .ok_or_else(|| StorageError::Missing(schema.name.clone()))?;

        Ok(table.rows.remove(index))
    }
}
