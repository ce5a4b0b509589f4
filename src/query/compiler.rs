//! # Query Compiler
//!
//! Applies untrusted request parameters to a policy-scoped queryable, in a
//! fixed order: identifier filter, field filters, ordering, pagination.
//!
//! Fields a client names are checked against the record type's declared
//! fields and, if present, the resource's `filterable` allow-list. Anything
//! else is dropped without failing the request.

use tracing::debug;

use crate::record::FieldValue;
use crate::schema::RecordSchema;

use super::filter::FilterExpr;
use super::parser::{parse_order, Page, PageLimits, Params};
use super::queryable::{OrderBy, Queryable};

/// Compiles request parameters for one resource
#[derive(Debug, Clone, Copy)]
pub struct QueryCompiler<'a> {
    schema: &'a RecordSchema,
    filterable: Option<&'a [String]>,
    limits: PageLimits,
}

impl<'a> QueryCompiler<'a> {
    pub fn new(schema: &'a RecordSchema, filterable: Option<&'a [String]>, limits: PageLimits) -> Self {
        Self {
            schema,
            filterable,
            limits,
        }
    }

    /// Compile a list query: optional `id` filter, field filters, order, page
    pub fn compile_list(&self, query: Queryable, params: &Params) -> Queryable {
        let query = match params.id.as_deref() {
            Some(raw) => query.where_eq(self.schema.primary_key.clone(), self.schema.cast_id(raw)),
            None => query,
        };

        let query = self.apply_filters(query, &params.filters);
        let query = query.order_by(self.order(params.order.as_deref()));

        let page = self.page(params);
        query.limit(page.limit).offset(page.offset)
    }

    /// Compile a single-row lookup: primary key filter, field filters, one row
    pub fn compile_get(&self, query: Queryable, id: &FieldValue, params: &Params) -> Queryable {
        let query = query.where_eq(self.schema.primary_key.clone(), id.clone());
        self.apply_filters(query, &params.filters).limit(1)
    }

    /// Whether clients may filter on this field
    pub fn is_filterable(&self, field: &str) -> bool {
        self.schema.has_field(field)
            && self
                .filterable
                .map_or(true, |allowed| allowed.iter().any(|f| f == field))
    }

    /// Parse filter entries, dropping fields that are unknown or not allowed
    pub fn filters(&self, entries: &[(String, String)]) -> Vec<FilterExpr> {
        entries
            .iter()
            .filter_map(|(field, raw)| {
                if !self.is_filterable(field) {
                    debug!(source = %self.schema.name, field = %field, "dropping filter on non-filterable field");
                    return None;
                }
                let field_type = self.schema.field(field).map(|def| def.field_type);
                Some(FilterExpr::parse(field, raw, field_type))
            })
            .collect()
    }

    /// Parse the order string; malformed strings yield no ordering
    pub fn order(&self, raw: Option<&str>) -> Vec<OrderBy> {
        let Some(raw) = raw else {
            return Vec::new();
        };

        match parse_order(raw) {
            Some(clauses) => clauses
                .into_iter()
                .filter(|clause| self.schema.has_field(&clause.field))
                .collect(),
            None => {
                debug!(source = %self.schema.name, order = %raw, "ignoring malformed order");
                Vec::new()
            }
        }
    }

    pub fn page(&self, params: &Params) -> Page {
        Page::resolve(params.limit.as_deref(), params.offset.as_deref(), &self.limits)
    }

    fn apply_filters(&self, query: Queryable, entries: &[(String, String)]) -> Queryable {
        self.filters(entries)
            .into_iter()
            .fold(query, |query, expr| query.filter(expr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::filter::FilterOperator;
    use crate::query::queryable::Predicate;
    use crate::schema::{FieldDef, FieldType};

    fn people() -> RecordSchema {
        RecordSchema::new("people")
            .with_field("age", FieldDef::optional(FieldType::Int))
            .with_field("role", FieldDef::optional(FieldType::String))
            .with_field("secret", FieldDef::optional(FieldType::String))
    }

    fn filters_of(query: &Queryable) -> Vec<FilterExpr> {
        query.filters().cloned().collect()
    }

    #[test]
    fn test_range_filter_compiles_to_two_conditions() {
        let schema = people();
        let compiler = QueryCompiler::new(&schema, None, PageLimits::default());
        let params = Params::new().with_filter("age", "gt:18").with_filter("age", "lt:65");

        let query = compiler.compile_list(Queryable::from_schema(&schema), &params);

        assert_eq!(
            filters_of(&query),
            vec![
                FilterExpr::new("age", FilterOperator::Gt, 18),
                FilterExpr::new("age", FilterOperator::Lt, 65),
            ]
        );
    }

    #[test]
    fn test_in_filter_compiles_to_list() {
        let schema = people();
        let compiler = QueryCompiler::new(&schema, None, PageLimits::default());
        let params = Params::new().with_filter("role", "in:admin,user");

        let query = compiler.compile_list(Queryable::from_schema(&schema), &params);

        assert_eq!(
            filters_of(&query),
            vec![FilterExpr::new(
                "role",
                FilterOperator::In,
                FieldValue::List(vec!["admin".into(), "user".into()])
            )]
        );
    }

    #[test]
    fn test_unknown_and_disallowed_fields_are_dropped() {
        let schema = people();
        let allowed = vec!["age".to_string(), "role".to_string()];
        let compiler = QueryCompiler::new(&schema, Some(allowed.as_slice()), PageLimits::default());
        let params = Params::new()
            .with_filter("password", "x")
            .with_filter("secret", "y")
            .with_filter("age", "3");

        let query = compiler.compile_list(Queryable::from_schema(&schema), &params);

        assert_eq!(filters_of(&query), vec![FilterExpr::eq("age", 3)]);
    }

    #[test]
    fn test_id_filter_comes_first() {
        let schema = people();
        let compiler = QueryCompiler::new(&schema, None, PageLimits::default());
        let params = Params::new().with_filter("age", "3").with_id("12");

        let query = compiler.compile_list(Queryable::from_schema(&schema), &params);

        assert_eq!(
            query.predicates[0],
            Predicate::Filter(FilterExpr::eq("id", 12))
        );
    }

    #[test]
    fn test_order_drops_unknown_fields_and_ignores_malformed() {
        let schema = people();
        let compiler = QueryCompiler::new(&schema, None, PageLimits::default());

        assert_eq!(
            compiler.order(Some("age.desc,nope.asc")),
            vec![OrderBy::desc("age")]
        );
        assert!(compiler.order(Some("age.desc,.asc")).is_empty());
        assert!(compiler.order(None).is_empty());
    }

    #[test]
    fn test_pagination_applied_last() {
        let schema = people();
        let compiler = QueryCompiler::new(&schema, None, PageLimits::default());
        let params = Params::new().with_limit("1000").with_offset("-4");

        let query = compiler.compile_list(Queryable::from_schema(&schema), &params);

        assert_eq!(query.limit, Some(200));
        assert_eq!(query.offset, 0);
    }

    #[test]
    fn test_get_is_single_row() {
        let schema = people();
        let compiler = QueryCompiler::new(&schema, None, PageLimits::default());

        let query = compiler.compile_get(
            Queryable::from_schema(&schema),
            &FieldValue::Int(4),
            &Params::new().with_limit("50"),
        );

        assert_eq!(query.limit, Some(1));
        assert_eq!(filters_of(&query), vec![FilterExpr::eq("id", 4)]);
    }
}
