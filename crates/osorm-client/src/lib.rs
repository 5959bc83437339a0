//! Search session and query execution for osorm.
//!
//! A [`SearchSession`] wraps a [`SearchTransport`]; `select::<M>()` returns a
//! [`QueryExecutor`] that builds a query for document type `M`, sends it and
//! maps hits back into `M` or aggregation responses into
//! [`AggregationResult`](osorm_query::AggregationResult) trees.

pub mod executor;
pub mod http;
pub mod session;
pub mod transport;

pub use executor::QueryExecutor;
pub use http::HttpTransport;
pub use session::SearchSession;
pub use transport::{SearchRequest, SearchTransport};
