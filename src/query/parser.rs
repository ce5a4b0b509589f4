//! # Request Parameter Parser
//!
//! Splits untrusted request parameters into filter entries, an order string,
//! and pagination, and parses the order and pagination parts. None of these
//! functions fail: malformed input degrades to "ignore this clause".

use serde::{Deserialize, Serialize};

use super::queryable::{Direction, OrderBy};

/// Default page size when no limit is given
pub const DEFAULT_LIMIT: usize = 50;

/// Ceiling for any requested page size
pub const MAX_LIMIT: usize = 200;

/// Raw request parameters, as received from a client
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    /// `field -> raw value` entries, in request order. Repeated fields are kept.
    pub filters: Vec<(String, String)>,
    pub order: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
    /// Identifier accompanying a list-style call
    pub id: Option<String>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from query-string pairs.
    ///
    /// `order`, `limit`, `offset` and `id` are reserved. `filter[field]` and
    /// any other key become filter entries on that field.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut params = Self::default();

        for (key, value) in pairs {
            let value = value.into();
            match key.as_ref() {
                "order" => params.order = Some(value),
                "limit" => params.limit = Some(value),
                "offset" => params.offset = Some(value),
                "id" => params.id = Some(value),
                other => {
                    let field = other
                        .strip_prefix("filter[")
                        .and_then(|rest| rest.strip_suffix(']'))
                        .unwrap_or(other);
                    params.filters.push((field.to_string(), value));
                }
            }
        }

        params
    }

    pub fn with_filter(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push((field.into(), value.into()));
        self
    }

    pub fn with_order(mut self, order: impl Into<String>) -> Self {
        self.order = Some(order.into());
        self
    }

    pub fn with_limit(mut self, limit: impl Into<String>) -> Self {
        self.limit = Some(limit.into());
        self
    }

    pub fn with_offset(mut self, offset: impl Into<String>) -> Self {
        self.offset = Some(offset.into());
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Configured pagination bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLimits {
    #[serde(default = "default_limit")]
    pub default_limit: usize,
    #[serde(default = "max_limit")]
    pub max_limit: usize,
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

fn max_limit() -> usize {
    MAX_LIMIT
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            max_limit: MAX_LIMIT,
        }
    }
}

/// Resolved pagination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: usize,
    pub offset: usize,
}

impl Page {
    /// Resolve raw limit/offset against the configured bounds.
    ///
    /// The limit always lands in `[0, max_limit]` and the offset in
    /// `[0, usize::MAX]`. Missing or non-numeric values use the defaults.
    pub fn resolve(limit: Option<&str>, offset: Option<&str>, bounds: &PageLimits) -> Self {
        let limit = limit
            .and_then(parse_bounded)
            .unwrap_or(bounds.default_limit as u128)
            .min(bounds.max_limit as u128) as usize;

        let offset = offset
            .and_then(parse_bounded)
            .unwrap_or(0)
            .min(usize::MAX as u128) as usize;

        Self { limit, offset }
    }
}

/// Parse a possibly-signed integer, clamping negatives to zero and saturating
/// digit strings too long for any integer type.
fn parse_bounded(raw: &str) -> Option<u128> {
    let raw = raw.trim();
    let (negative, digits) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if negative {
        return Some(0);
    }

    Some(digits.parse().unwrap_or(u128::MAX))
}

/// Parse an order string such as `inserted_at.desc,title`.
///
/// Directions other than `asc`/`desc` (or none at all) mean ascending.
/// Returns `None` if the string is malformed anywhere: an empty field name,
/// more than one `.` in a token, or characters outside `[A-Za-z0-9_]` in a
/// field name. Empty tokens (`a,,b`) are skipped.
pub fn parse_order(raw: &str) -> Option<Vec<OrderBy>> {
    let mut clauses = Vec::new();

    for token in raw.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }

        let (field, direction) = match token.split_once('.') {
            Some((field, dir)) => {
                if dir.contains('.') {
                    return None;
                }
                let direction = match dir {
                    "desc" => Direction::Desc,
                    _ => Direction::Asc,
                };
                (field, direction)
            }
            None => (token, Direction::Asc),
        };

        if field.is_empty() || !field.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
            return None;
        }

        clauses.push(OrderBy {
            field: field.to_string(),
            direction,
        });
    }

    Some(clauses)
}
