//! Leaf query expressions.
//!
//! Each variant compiles to one fragment of the engine's JSON query grammar.
//! Compilation is a pure function of the node's fields.

use serde_json::{json, Map, Value};

use crate::bound::Bound;

/// Abstract syntax tree of a single query predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Exact phrase match: `{"match_phrase": {field: value}}`.
    MatchPhrase { field: String, value: Value },
    /// Phrase prefix match: `{"match_phrase_prefix": {field: value}}`.
    MatchPhrasePrefix { field: String, value: Value },
    /// Wildcard pattern: `{"wildcard": {field: value}}`.
    Wildcard { field: String, value: Value },
    /// Regular expression: `{"regexp": {field: value}}`.
    RegExp { field: String, value: Value },
    /// Bounded comparison, see [`RangeExpr`].
    Range(RangeExpr),
    /// At least `min_match` of the values must phrase-match.
    Contains {
        field: String,
        values: Vec<Value>,
        min_match: u32,
    },
}

impl Expression {
    pub fn match_phrase(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::MatchPhrase {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn match_phrase_prefix(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::MatchPhrasePrefix {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn wildcard(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Wildcard {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn regexp(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::RegExp {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Closed interval `[low, high]`; either side may be `None`.
    pub fn range<L, H>(field: impl Into<String>, low: Option<L>, high: Option<H>) -> Self
    where
        L: Into<Bound>,
        H: Into<Bound>,
    {
        Self::Range(RangeExpr::new(field, low, high))
    }

    /// Any one of `values` must match.
    pub fn contains<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::contains_at_least(field, values, 1)
    }

    /// At least `min_match` of `values` must match.
    pub fn contains_at_least<I, V>(field: impl Into<String>, values: I, min_match: u32) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::Contains {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
            min_match,
        }
    }

    /// Field the predicate applies to.
    pub fn field(&self) -> &str {
        match self {
            Self::MatchPhrase { field, .. }
            | Self::MatchPhrasePrefix { field, .. }
            | Self::Wildcard { field, .. }
            | Self::RegExp { field, .. }
            | Self::Contains { field, .. } => field,
            Self::Range(range) => &range.field,
        }
    }

    /// Compile into a query fragment.
    pub fn compile(&self) -> Value {
        match self {
            Self::MatchPhrase { field, value } => leaf("match_phrase", field, value),
            Self::MatchPhrasePrefix { field, value } => leaf("match_phrase_prefix", field, value),
            Self::Wildcard { field, value } => leaf("wildcard", field, value),
            Self::RegExp { field, value } => leaf("regexp", field, value),
            Self::Range(range) => range.compile(),
            Self::Contains {
                field,
                values,
                min_match,
            } => json!({
                "bool": {
                    "should": values
                        .iter()
                        .map(|value| leaf("match_phrase", field, value))
                        .collect::<Vec<_>>(),
                    "minimum_should_match": min_match,
                }
            }),
        }
    }
}

impl From<RangeExpr> for Expression {
    fn from(range: RangeExpr) -> Self {
        Self::Range(range)
    }
}

fn leaf(kind: &str, field: &str, value: &Value) -> Value {
    let mut inner = Map::new();
    inner.insert(field.to_owned(), value.clone());
    let mut outer = Map::new();
    outer.insert(kind.to_owned(), Value::Object(inner));
    Value::Object(outer)
}

/// Range predicate over an interval with independently open or closed ends.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeExpr {
    pub field: String,
    pub low: Option<Bound>,
    pub high: Option<Bound>,
    pub left_open: bool,
    pub right_open: bool,
}

impl RangeExpr {
    pub fn new<L, H>(field: impl Into<String>, low: Option<L>, high: Option<H>) -> Self
    where
        L: Into<Bound>,
        H: Into<Bound>,
    {
        Self {
            field: field.into(),
            low: low.map(Into::into),
            high: high.map(Into::into),
            left_open: false,
            right_open: false,
        }
    }

    /// `field >= low` (or `>` when left-open).
    pub fn at_least(field: impl Into<String>, low: impl Into<Bound>) -> Self {
        Self {
            field: field.into(),
            low: Some(low.into()),
            high: None,
            left_open: false,
            right_open: false,
        }
    }

    /// `field <= high` (or `<` when right-open).
    pub fn at_most(field: impl Into<String>, high: impl Into<Bound>) -> Self {
        Self {
            field: field.into(),
            low: None,
            high: Some(high.into()),
            left_open: false,
            right_open: false,
        }
    }

    pub fn left_open(mut self, open: bool) -> Self {
        self.left_open = open;
        self
    }

    pub fn right_open(mut self, open: bool) -> Self {
        self.right_open = open;
        self
    }

    pub fn compile(&self) -> Value {
        let mut ops = Map::new();
        if let Some(low) = &self.low {
            let op = if self.left_open { "gt" } else { "gte" };
            ops.insert(op.to_owned(), low.to_value());
        }
        if let Some(high) = &self.high {
            let op = if self.right_open { "lt" } else { "lte" };
            ops.insert(op.to_owned(), high.to_value());
        }

        let mut inner = Map::new();
        inner.insert(self.field.clone(), Value::Object(ops));
        json!({ "range": inner })
    }
}
