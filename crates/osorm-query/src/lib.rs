//! Query compilation and aggregation decoding for osorm.
//!
//! [`ModelQuery`] collects [`Expression`] nodes, either built directly or
//! parsed from suffix-operator clauses such as `age__gte`, and compiles them
//! into one `bool` query. [`Aggregation`] chains compile into depth-keyed
//! `aggs` fragments, and [`decode`] walks the matching response back into an
//! [`AggregationResult`].

pub mod aggs;
pub mod bound;
pub mod clause;
pub mod decode;
pub mod expr;
pub mod operator;
pub mod query;
pub mod sort;

pub use aggs::{Aggregation, Terms};
pub use bound::Bound;
pub use clause::ClauseParser;
pub use decode::{decode, AggregationResult};
pub use expr::{Expression, RangeExpr};
pub use operator::Operator;
pub use query::ModelQuery;
pub use sort::{SortOrder, SortSpec};
