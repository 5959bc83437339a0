use serde_json::Value;

use osorm_core::{CoreError, CoreResult};

use crate::expr::{Expression, RangeExpr};

/// Field-name suffix selecting a non-default predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Prefix,
    Regexp,
    Contains,
    Gte,
    Gt,
    Lte,
    Lt,
}

impl Operator {
    /// Every operator, in the order suffixes are tried.
    pub const ALL: [Operator; 7] = [
        Operator::Prefix,
        Operator::Regexp,
        Operator::Contains,
        Operator::Gte,
        Operator::Gt,
        Operator::Lte,
        Operator::Lt,
    ];

    #[must_use]
    pub const fn suffix(&self) -> &'static str {
        match self {
            Self::Prefix => "__prefix",
            Self::Regexp => "__regexp",
            Self::Contains => "__contains",
            Self::Gte => "__gte",
            Self::Gt => "__gt",
            Self::Lte => "__lte",
            Self::Lt => "__lt",
        }
    }

    /// Split a raw clause name into its base field and operator, if any.
    pub fn split(raw_field: &str) -> (&str, Option<Operator>) {
        for op in Self::ALL {
            if let Some(field) = raw_field.strip_suffix(op.suffix()) {
                return (field, Some(op));
            }
        }
        (raw_field, None)
    }

    /// Build the expression this operator denotes for `field` and `value`.
    pub fn build(&self, field: &str, value: Value) -> CoreResult<Expression> {
        let expr = match self {
            Self::Contains => match value {
                Value::Array(values) => Expression::Contains {
                    field: field.to_owned(),
                    values,
                    min_match: 1,
                },
                other => {
                    return Err(CoreError::invalid_clause(
                        format!("{field}{}", self.suffix()),
                        format!("expected an array of candidates, found {other}"),
                    ))
                }
            },
            Self::Prefix => Expression::match_phrase_prefix(field, self.string_value(field, value)?),
            Self::Regexp => Expression::regexp(field, self.string_value(field, value)?),
            Self::Gte => RangeExpr::at_least(field, value).into(),
            Self::Gt => RangeExpr::at_least(field, value).left_open(true).into(),
            Self::Lte => RangeExpr::at_most(field, value).into(),
            Self::Lt => RangeExpr::at_most(field, value).right_open(true).into(),
        };
        Ok(expr)
    }

    fn string_value(&self, field: &str, value: Value) -> CoreResult<Value> {
        if value.is_string() {
            Ok(value)
        } else {
            Err(CoreError::invalid_clause(
                format!("{field}{}", self.suffix()),
                format!("expected a string pattern, found {value}"),
            ))
        }
    }
}
