//! # Filter Expressions
//!
//! Parsed `(field, operator, value)` triples and their evaluation against a
//! record. Storage collaborators that cannot push a filter down can fall back
//! to [`FilterExpr::matches`].

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::record::{FieldValue, Record};
use crate::schema::FieldType;

/// Filter operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    /// Case-sensitive pattern match (`%` any run, `_` one char)
    Like,
    /// Case-insensitive pattern match
    Ilike,
    In,
    NotIn,
    /// Value is `Bool(true)` for "is null", `Bool(false)` for "is not null"
    IsNull,
}

impl FilterOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Eq => "eq",
            FilterOperator::Ne => "ne",
            FilterOperator::Gt => "gt",
            FilterOperator::Gte => "gte",
            FilterOperator::Lt => "lt",
            FilterOperator::Lte => "lte",
            FilterOperator::Like => "like",
            FilterOperator::Ilike => "ilike",
            FilterOperator::In => "in",
            FilterOperator::NotIn => "not_in",
            FilterOperator::IsNull => "is_nil",
        }
    }

    /// Operator for a raw value prefix token (the part before `:`)
    pub fn from_prefix(token: &str) -> Option<Self> {
        match token {
            "like" => Some(FilterOperator::Like),
            "ilike" => Some(FilterOperator::Ilike),
            "gt" => Some(FilterOperator::Gt),
            "gte" => Some(FilterOperator::Gte),
            "lt" => Some(FilterOperator::Lt),
            "lte" => Some(FilterOperator::Lte),
            "ne" => Some(FilterOperator::Ne),
            "in" => Some(FilterOperator::In),
            "not_in" => Some(FilterOperator::NotIn),
            "is_nil" => Some(FilterOperator::IsNull),
            _ => None,
        }
    }
}

/// A filter expression
#[derive(Debug, Clone, PartialEq)]
pub struct FilterExpr {
    pub field: String,
    pub operator: FilterOperator,
    pub value: FieldValue,
}

impl FilterExpr {
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: impl Into<FieldValue>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    /// Create an equality filter
    pub fn eq(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::new(field, FilterOperator::Eq, value)
    }

    /// Parse a raw `field=value` pair.
    ///
    /// The value may carry an operator prefix (`gt:18`, `in:a,b`). An unknown
    /// or absent prefix means exact match on the whole value. `field_type` is
    /// the declared type of the field, if known.
    pub fn parse(field: &str, raw: &str, field_type: Option<FieldType>) -> Self {
        let (operator, rest) = match raw.split_once(':') {
            Some((token, rest)) => match FilterOperator::from_prefix(token) {
                Some(op) => (op, rest),
                None => (FilterOperator::Eq, raw),
            },
            None => (FilterOperator::Eq, raw),
        };

        let value = match operator {
            FilterOperator::In | FilterOperator::NotIn => FieldValue::List(
                rest.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(|s| cast_filter_value(s, field_type))
                    .collect(),
            ),
            FilterOperator::IsNull => FieldValue::Bool(rest.trim() != "false"),
            FilterOperator::Like | FilterOperator::Ilike => FieldValue::Text(rest.to_string()),
            _ => cast_filter_value(rest, field_type),
        };

        Self {
            field: field.to_string(),
            operator,
            value,
        }
    }

    /// Check if a record matches this filter
    pub fn matches(&self, record: &Record) -> bool {
        let field_value = record.get(&self.field).filter(|v| !v.is_null());

        if self.operator == FilterOperator::IsNull {
            let want_null = !matches!(self.value, FieldValue::Bool(false));
            return field_value.is_none() == want_null;
        }

        // Comparisons against null are never true
        let Some(field_value) = field_value else {
            return false;
        };

        match self.operator {
            FilterOperator::Eq => field_value.loose_eq(&self.value),
            FilterOperator::Ne => !field_value.loose_eq(&self.value),
            FilterOperator::Gt => field_value.compare(&self.value).map_or(false, |o| o.is_gt()),
            FilterOperator::Gte => field_value.compare(&self.value).map_or(false, |o| o.is_ge()),
            FilterOperator::Lt => field_value.compare(&self.value).map_or(false, |o| o.is_lt()),
            FilterOperator::Lte => field_value.compare(&self.value).map_or(false, |o| o.is_le()),
            FilterOperator::Like => match (field_value, &self.value) {
                (FieldValue::Text(s), FieldValue::Text(p)) => like_match(s, p),
                _ => false,
            },
            FilterOperator::Ilike => match (field_value, &self.value) {
                (FieldValue::Text(s), FieldValue::Text(p)) => {
                    like_match(&s.to_lowercase(), &p.to_lowercase())
                }
                _ => false,
            },
            FilterOperator::In => match &self.value {
                FieldValue::List(items) => items.iter().any(|v| field_value.loose_eq(v)),
                _ => false,
            },
            FilterOperator::NotIn => match &self.value {
                FieldValue::List(items) => !items.iter().any(|v| field_value.loose_eq(v)),
                _ => false,
            },
            FilterOperator::IsNull => unreachable!("handled above"),
        }
    }
}

fn int_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^-?\d+$").ok()).as_ref()
}

fn float_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^-?\d+\.\d+$").ok()).as_ref()
}

fn is_match(pattern: Option<&Regex>, raw: &str) -> bool {
    pattern.map_or(false, |re| re.is_match(raw))
}

/// Opportunistically cast a raw filter value.
///
/// `^-?\d+$` becomes an integer, `^-?\d+\.\d+$` a float, anything else stays
/// text. A value that matches a numeric pattern but does not fit the numeric
/// type falls back to text. Values for fields declared as strings are never
/// cast, so `zip=02134` keeps its leading zero.
pub fn cast_filter_value(raw: &str, field_type: Option<FieldType>) -> FieldValue {
    if field_type == Some(FieldType::String) {
        return FieldValue::Text(raw.to_string());
    }

    try_cast_number(raw).unwrap_or_else(|| FieldValue::Text(raw.to_string()))
}

fn try_cast_number(raw: &str) -> Option<FieldValue> {
    if is_match(int_pattern(), raw) {
        return raw.parse().ok().map(FieldValue::Int);
    }
    if is_match(float_pattern(), raw) {
        return raw.parse().ok().map(FieldValue::Float);
    }
    None
}

/// SQL LIKE matching: `%` matches any run of characters, `_` exactly one.
fn like_match(value: &str, pattern: &str) -> bool {
    let value: Vec<char> = value.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();

    let (mut v, mut p) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while v < value.len() {
        if p < pattern.len() && (pattern[p] == '_' || pattern[p] == value[v]) {
            v += 1;
            p += 1;
        } else if p < pattern.len() && pattern[p] == '%' {
            backtrack = Some((p, v));
            p += 1;
        } else if let Some((star_p, star_v)) = backtrack {
            p = star_p + 1;
            v = star_v + 1;
            backtrack = Some((star_p, star_v + 1));
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|c| *c == '%')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(age: i64, role: &str) -> Record {
        Record::new().with("age", age).with("role", role).with("name", "Wilson")
    }

    #[test]
    fn test_parse_prefixed_operators() {
        let gt = FilterExpr::parse("age", "gt:18", None);
        assert_eq!(gt.operator, FilterOperator::Gt);
        assert_eq!(gt.value, FieldValue::Int(18));

        let gte = FilterExpr::parse("age", "gte:18", None);
        assert_eq!(gte.operator, FilterOperator::Gte);

        let eq = FilterExpr::parse("name", "John", None);
        assert_eq!(eq.operator, FilterOperator::Eq);
        assert_eq!(eq.value, FieldValue::from("John"));
    }

    #[test]
    fn test_unknown_prefix_is_exact_match_on_whole_value() {
        let expr = FilterExpr::parse("starts_at", "12:30", None);
        assert_eq!(expr.operator, FilterOperator::Eq);
        assert_eq!(expr.value, FieldValue::from("12:30"));
    }

    #[test]
    fn test_parse_in_list_is_split_and_trimmed() {
        let expr = FilterExpr::parse("role", "in:admin, user ,", None);
        assert_eq!(expr.operator, FilterOperator::In);
        assert_eq!(
            expr.value,
            FieldValue::List(vec!["admin".into(), "user".into()])
        );
    }

    #[test]
    fn test_value_cast() {
        assert_eq!(cast_filter_value("-12", None), FieldValue::Int(-12));
        assert_eq!(cast_filter_value("3.25", None), FieldValue::Float(3.25));
        assert_eq!(cast_filter_value("3.", None), FieldValue::from("3."));
        assert_eq!(cast_filter_value("1e5", None), FieldValue::from("1e5"));
        assert_eq!(
            cast_filter_value("99999999999999999999", None),
            FieldValue::from("99999999999999999999")
        );
        assert_eq!(
            cast_filter_value("02134", Some(FieldType::String)),
            FieldValue::from("02134")
        );
    }

    #[test]
    fn test_comparison_filters() {
        let gt = FilterExpr::parse("age", "gt:18", None);
        let lt = FilterExpr::parse("age", "lt:65", None);

        assert!(gt.matches(&person(30, "user")) && lt.matches(&person(30, "user")));
        assert!(!gt.matches(&person(18, "user")));
        assert!(!lt.matches(&person(70, "user")));
    }

    #[test]
    fn test_membership_filters() {
        let is_in = FilterExpr::parse("role", "in:admin,user", None);
        let not_in = FilterExpr::parse("role", "not_in:admin,user", None);

        assert!(is_in.matches(&person(1, "admin")));
        assert!(!is_in.matches(&person(1, "guest")));
        assert!(not_in.matches(&person(1, "guest")));
    }

    #[test]
    fn test_like_filters() {
        assert!(FilterExpr::parse("name", "like:%son", None).matches(&person(1, "x")));
        assert!(!FilterExpr::parse("name", "like:%SON", None).matches(&person(1, "x")));
        assert!(FilterExpr::parse("name", "ilike:%SON", None).matches(&person(1, "x")));
        assert!(FilterExpr::parse("name", "like:W_lson", None).matches(&person(1, "x")));
        assert!(!FilterExpr::parse("name", "like:W_son", None).matches(&person(1, "x")));
    }

    #[test]
    fn test_is_nil_filter() {
        let record = Record::new().with("deleted_at", FieldValue::Null).with("age", 3);

        assert!(FilterExpr::parse("deleted_at", "is_nil:true", None).matches(&record));
        assert!(!FilterExpr::parse("age", "is_nil:true", None).matches(&record));
        assert!(FilterExpr::parse("age", "is_nil:false", None).matches(&record));
        assert!(FilterExpr::parse("missing", "is_nil:true", None).matches(&record));
    }

    #[test]
    fn test_null_never_compares() {
        let record = Record::new().with("age", FieldValue::Null);
        assert!(!FilterExpr::parse("age", "ne:3", None).matches(&record));
        assert!(!FilterExpr::parse("age", "gt:3", None).matches(&record));
    }
}
