//! Boolean query builder.
//!
//! [`ModelQuery`] holds three ordered expression lists and compiles them into
//! a single `bool` fragment:
//! - `filter`: every expression must match
//! - `union`: at least one expression must match, when any are present
//! - `exclude`: no expression may match

use std::sync::Arc;

use serde_json::{json, Value};

use osorm_core::{CoreResult, FieldSet};

use crate::clause::ClauseParser;
use crate::expr::Expression;

/// Fluent builder for the `bool` query sent with every request.
#[derive(Debug, Clone)]
pub struct ModelQuery {
    fields: Arc<FieldSet>,
    filter: Vec<Expression>,
    union: Vec<Expression>,
    exclude: Vec<Expression>,
}

impl ModelQuery {
    /// Create an empty query validating clause names against `fields`.
    pub fn new(fields: Arc<FieldSet>) -> Self {
        Self {
            fields,
            filter: Vec::new(),
            union: Vec::new(),
            exclude: Vec::new(),
        }
    }

    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }

    fn parser(&self) -> ClauseParser<'_> {
        ClauseParser::new(&self.fields)
    }

    /// Require every given expression and clause to match.
    ///
    /// Clauses are parsed before anything is appended, so an invalid clause
    /// leaves the query unchanged.
    pub fn filter<E, C>(&mut self, exprs: E, clauses: C) -> CoreResult<&mut Self>
    where
        E: IntoIterator<Item = Expression>,
        C: IntoIterator<Item = (String, Value)>,
    {
        let parsed = self.parser().parse_clauses(clauses)?;
        self.filter.extend(exprs);
        self.filter.extend(parsed);
        Ok(self)
    }

    /// Require at least one of the union expressions to match.
    pub fn union<E, C>(&mut self, exprs: E, clauses: C) -> CoreResult<&mut Self>
    where
        E: IntoIterator<Item = Expression>,
        C: IntoIterator<Item = (String, Value)>,
    {
        let parsed = self.parser().parse_clauses(clauses)?;
        self.union.extend(exprs);
        self.union.extend(parsed);
        Ok(self)
    }

    /// Reject documents matching any of the given expressions or clauses.
    pub fn exclude<E, C>(&mut self, exprs: E, clauses: C) -> CoreResult<&mut Self>
    where
        E: IntoIterator<Item = Expression>,
        C: IntoIterator<Item = (String, Value)>,
    {
        let parsed = self.parser().parse_clauses(clauses)?;
        self.exclude.extend(exprs);
        self.exclude.extend(parsed);
        Ok(self)
    }

    /// Single-clause form of [`filter`](Self::filter).
    pub fn filter_by(&mut self, raw_field: &str, value: impl Into<Value>) -> CoreResult<&mut Self> {
        let expr = self.parser().parse_clause(raw_field, value.into())?;
        self.filter.push(expr);
        Ok(self)
    }

    /// Single-clause form of [`union`](Self::union).
    pub fn union_by(&mut self, raw_field: &str, value: impl Into<Value>) -> CoreResult<&mut Self> {
        let expr = self.parser().parse_clause(raw_field, value.into())?;
        self.union.push(expr);
        Ok(self)
    }

    /// Single-clause form of [`exclude`](Self::exclude).
    pub fn exclude_by(&mut self, raw_field: &str, value: impl Into<Value>) -> CoreResult<&mut Self> {
        let expr = self.parser().parse_clause(raw_field, value.into())?;
        self.exclude.push(expr);
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.filter.is_empty() && self.union.is_empty() && self.exclude.is_empty()
    }

    /// Compile into a `bool` query fragment.
    pub fn compile(&self) -> Value {
        let compile_all = |exprs: &[Expression]| exprs.iter().map(Expression::compile).collect::<Vec<_>>();

        json!({
            "bool": {
                "must_not": compile_all(&self.exclude),
                "should": compile_all(&self.union),
                "filter": compile_all(&self.filter),
                "minimum_should_match": if self.union.is_empty() { 0 } else { 1 },
            }
        })
    }
}
