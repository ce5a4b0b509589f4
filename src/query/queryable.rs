//! # Queryable
//!
//! An abstract, composable query-in-progress. Policies and the compiler only
//! ever add restrictions to it; a storage collaborator turns it into rows.

use serde::{Deserialize, Serialize};

use crate::record::{FieldValue, Record};
use crate::schema::RecordSchema;

use super::filter::FilterExpr;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

/// Order by clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

impl OrderBy {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Desc,
        }
    }
}

/// A single restriction on a queryable. All predicates are ANDed.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Filter(FilterExpr),
    /// Matches no row
    Never,
}

/// A query against one record source
#[derive(Debug, Clone, PartialEq)]
pub struct Queryable {
    /// Storage source name (the record type's name)
    pub source: String,
    pub predicates: Vec<Predicate>,
    pub order: Vec<OrderBy>,
    pub limit: Option<usize>,
    pub offset: usize,
}

impl Queryable {
    /// Unrestricted query over a source
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            predicates: Vec::new(),
            order: Vec::new(),
            limit: None,
            offset: 0,
        }
    }

    /// Unrestricted query over a record type
    pub fn from_schema(schema: &RecordSchema) -> Self {
        Self::new(schema.name.clone())
    }

    /// Restrict to no rows at all
    pub fn none(mut self) -> Self {
        self.predicates.push(Predicate::Never);
        self
    }

    pub fn filter(mut self, expr: FilterExpr) -> Self {
        self.predicates.push(Predicate::Filter(expr));
        self
    }

    pub fn where_eq(self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.filter(FilterExpr::eq(field, value))
    }

    /// Append ordering clauses after any existing ones
    pub fn order_by(mut self, order: impl IntoIterator<Item = OrderBy>) -> Self {
        self.order.extend(order);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Whether the query can never return a row
    pub fn is_never(&self) -> bool {
        self.predicates.iter().any(|p| matches!(p, Predicate::Never))
    }

    /// Evaluate all predicates against a record
    pub fn matches(&self, record: &Record) -> bool {
        self.predicates.iter().all(|p| match p {
            Predicate::Filter(expr) => expr.matches(record),
            Predicate::Never => false,
        })
    }

    /// Filter expressions in application order
    pub fn filters(&self) -> impl Iterator<Item = &FilterExpr> {
        self.predicates.iter().filter_map(|p| match p {
            Predicate::Filter(expr) => Some(expr),
            Predicate::Never => None,
        })
    }
}
