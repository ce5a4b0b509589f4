//! # Query Compiler
//!
//! Turns untrusted request parameters (filters, order, pagination) into a
//! bounded transformation of a [`Queryable`].
//!
//! ## Guarantees
//!
//! - Clients can only reference declared (and allow-listed) fields
//! - Every compiled list query carries a limit in `[0, max_limit]`
//! - No parameter can fail a request; bad input is ignored clause by clause

pub mod compiler;
pub mod filter;
pub mod parser;
pub mod queryable;

pub use compiler::QueryCompiler;
pub use filter::{cast_filter_value, FilterExpr, FilterOperator};
pub use parser::{parse_order, Page, PageLimits, Params, DEFAULT_LIMIT, MAX_LIMIT};
pub use queryable::{Direction, OrderBy, Predicate, Queryable};
