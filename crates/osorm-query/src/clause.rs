//! Clause parser for suffix-operator field names.
//!
//! A clause is a `(raw_field, value)` pair such as `("age__gte", 18)`. The
//! parser strips the first recognized [`Operator`] suffix, validates the base
//! field against the document model and builds the matching [`Expression`].
//! A name without suffix becomes an exact phrase match.

use serde_json::Value;
use tracing::debug;

use osorm_core::{CoreError, CoreResult, FieldSet};

use crate::expr::Expression;
use crate::operator::Operator;

/// Parser that validates clause field names against a declared [`FieldSet`].
#[derive(Debug, Clone, Copy)]
pub struct ClauseParser<'a> {
    fields: &'a FieldSet,
}

impl<'a> ClauseParser<'a> {
    pub fn new(fields: &'a FieldSet) -> Self {
        Self { fields }
    }

    /// Fails with [`CoreError::UnknownField`] when `field` is not declared.
    pub fn check_field(&self, field: &str) -> CoreResult<()> {
        if self.fields.contains(field) {
            Ok(())
        } else {
            Err(CoreError::unknown_field(field))
        }
    }

    /// Parse one clause into an expression.
    pub fn parse_clause(&self, raw_field: &str, value: Value) -> CoreResult<Expression> {
        let (field, op) = Operator::split(raw_field);
        self.check_field(field)?;

        match op {
            Some(op) => {
                debug!(field, raw = raw_field, op = op.suffix(), "parse clause");
                op.build(field, value)
            }
            None => {
                debug!(field, "parse clause as phrase match");
                Ok(Expression::match_phrase(field, value))
            }
        }
    }

    /// Parse every clause in order, stopping at the first invalid one.
    pub fn parse_clauses<I, K>(&self, clauses: I) -> CoreResult<Vec<Expression>>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        clauses
            .into_iter()
            .map(|(raw_field, value)| self.parse_clause(raw_field.as_ref(), value))
            .collect()
    }
}
