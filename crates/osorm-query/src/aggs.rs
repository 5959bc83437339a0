//! Aggregation nodes.
//!
//! Aggregations form a singly linked chain: a [`Terms`] bucket holds at most
//! one nested child, metrics are leaves. Every level is emitted under its
//! depth, rendered as a string key (`"1"`, `"2"`, ...), which is also the key
//! [`decode`](crate::decode::decode) reads back from the response.

use serde_json::{json, Map, Value};

/// Default bucket count for a terms aggregation.
pub const DEFAULT_MAX_BUCKETS: u32 = 100;

/// Name of the exact-value sub-field the engine maps for text fields.
pub fn keyword_field(field: &str) -> String {
    format!("{field}.keyword")
}

/// Bucket or metric aggregation.
#[derive(Debug, Clone, PartialEq)]
pub enum Aggregation {
    /// Group documents by distinct values of a field.
    Terms(Terms),
    /// Sum of a numeric field.
    Sum { field: String },
    /// Approximate count of distinct values.
    Cardinality { field: String },
}

impl Aggregation {
    pub fn terms(field: impl Into<String>, max_buckets: u32) -> Terms {
        Terms::new(field, max_buckets)
    }

    pub fn sum(field: impl Into<String>) -> Self {
        Self::Sum {
            field: field.into(),
        }
    }

    pub fn cardinality(field: impl Into<String>) -> Self {
        Self::Cardinality {
            field: field.into(),
        }
    }

    /// Target the `.keyword` sub-field of a text field.
    ///
    /// Applies to this node only; a nested child keeps its own field.
    pub fn text(self) -> Self {
        match self {
            Self::Terms(terms) => Self::Terms(terms.text()),
            Self::Sum { field } => Self::Sum {
                field: keyword_field(&field),
            },
            Self::Cardinality { field } => Self::Cardinality {
                field: keyword_field(&field),
            },
        }
    }

    /// Compile this level and its descendants, keyed by `depth`.
    pub fn compile(&self, depth: u32) -> Value {
        let body = match self {
            Self::Terms(terms) => json!({
                "terms": {
                    "field": terms.field,
                    "size": terms.max_buckets,
                },
                "aggs": terms
                    .child
                    .as_ref()
                    .map(|child| child.compile(depth + 1))
                    .unwrap_or_else(|| json!({})),
            }),
            Self::Sum { field } => json!({ "sum": { "field": field } }),
            Self::Cardinality { field } => json!({ "cardinality": { "field": field } }),
        };

        let mut level = Map::new();
        level.insert(depth.to_string(), body);
        Value::Object(level)
    }
}

impl From<Terms> for Aggregation {
    fn from(terms: Terms) -> Self {
        Self::Terms(terms)
    }
}

/// Terms bucket aggregation with an optional nested child.
#[derive(Debug, Clone, PartialEq)]
pub struct Terms {
    pub field: String,
    pub max_buckets: u32,
    pub child: Option<Box<Aggregation>>,
}

impl Terms {
    pub fn new(field: impl Into<String>, max_buckets: u32) -> Self {
        Self {
            field: field.into(),
            max_buckets,
            child: None,
        }
    }

    /// Terms over `field` with [`DEFAULT_MAX_BUCKETS`].
    pub fn on(field: impl Into<String>) -> Self {
        Self::new(field, DEFAULT_MAX_BUCKETS)
    }

    /// Group on the `.keyword` sub-field of a text field.
    pub fn text(mut self) -> Self {
        self.field = keyword_field(&self.field);
        self
    }

    /// Attach the aggregation computed inside every bucket.
    ///
    /// A second call replaces the previous child.
    pub fn nested(mut self, child: impl Into<Aggregation>) -> Self {
        self.child = Some(Box::new(child.into()));
        self
    }

    pub fn compile(&self, depth: u32) -> Value {
        Aggregation::Terms(self.clone()).compile(depth)
    }
}
