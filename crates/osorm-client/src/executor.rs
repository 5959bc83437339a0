//! Query execution for one document type.
//!
//! [`QueryExecutor`] combines a [`ModelQuery`] with pagination and sort
//! options, sends it through the session transport and maps the response:
//! hits are parsed into `M`, aggregation responses are decoded into
//! [`AggregationResult`] trees.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, BoxStream, StreamExt};
use indexmap::IndexMap;
use serde_json::{json, Value};
use tracing::debug;

use osorm_core::{CoreError, CoreResult, Document};
use osorm_query::{
    decode, Aggregation, AggregationResult, Expression, ModelQuery, SortSpec, Terms,
};

use crate::transport::{SearchRequest, SearchTransport};

/// Builder and runner of queries against `M::INDEX`.
///
/// Builder calls borrow the executor mutably; a call that fails validation
/// leaves the query, pagination and sort keys as they were.
pub struct QueryExecutor<M> {
    query: ModelQuery,
    limit: Option<u64>,
    offset: Option<u64>,
    sort: Vec<SortSpec>,
    transport: Arc<dyn SearchTransport>,
    scroll_lifetime: Duration,
    _model: PhantomData<fn() -> M>,
}

impl<M> std::fmt::Debug for QueryExecutor<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryExecutor")
            .field("query", &self.query)
            .field("limit", &self.limit)
            .field("offset", &self.offset)
            .field("sort", &self.sort)
            .field("scroll_lifetime", &self.scroll_lifetime)
            .finish_non_exhaustive()
    }
}

impl<M: Document> QueryExecutor<M> {
    pub(crate) fn new(transport: Arc<dyn SearchTransport>, scroll_lifetime: Duration) -> Self {
        Self {
            query: ModelQuery::new(Arc::new(M::default_fields())),
            limit: None,
            offset: None,
            sort: Vec::new(),
            transport,
            scroll_lifetime,
            _model: PhantomData,
        }
    }

    pub fn filter<E, C>(&mut self, exprs: E, clauses: C) -> CoreResult<&mut Self>
    where
        E: IntoIterator<Item = Expression>,
        C: IntoIterator<Item = (String, Value)>,
    {
        self.query.filter(exprs, clauses)?;
        Ok(self)
    }

    pub fn union<E, C>(&mut self, exprs: E, clauses: C) -> CoreResult<&mut Self>
    where
        E: IntoIterator<Item = Expression>,
        C: IntoIterator<Item = (String, Value)>,
    {
        self.query.union(exprs, clauses)?;
        Ok(self)
    }

    pub fn exclude<E, C>(&mut self, exprs: E, clauses: C) -> CoreResult<&mut Self>
    where
        E: IntoIterator<Item = Expression>,
        C: IntoIterator<Item = (String, Value)>,
    {
        self.query.exclude(exprs, clauses)?;
        Ok(self)
    }

    pub fn filter_by(
        &mut self,
        raw_field: &str,
        value: impl Into<Value>,
    ) -> CoreResult<&mut Self> {
        self.query.filter_by(raw_field, value)?;
        Ok(self)
    }

    pub fn union_by(
        &mut self,
        raw_field: &str,
        value: impl Into<Value>,
    ) -> CoreResult<&mut Self> {
        self.query.union_by(raw_field, value)?;
        Ok(self)
    }

    pub fn exclude_by(
        &mut self,
        raw_field: &str,
        value: impl Into<Value>,
    ) -> CoreResult<&mut Self> {
        self.query.exclude_by(raw_field, value)?;
        Ok(self)
    }

    /// Maximum number of hits returned.
    pub fn limit(&mut self, limit: u64) -> &mut Self {
        self.limit = Some(limit);
        self
    }

    /// Number of hits skipped.
    pub fn offset(&mut self, offset: u64) -> &mut Self {
        self.offset = Some(offset);
        self
    }

    /// Sort keys; a leading `-` sorts descending. Replaces earlier keys.
    pub fn sort_by<I, S>(&mut self, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.sort = fields
            .into_iter()
            .map(|field| SortSpec::parse(field.as_ref()))
            .collect();
        self
    }

    pub fn query(&self) -> &ModelQuery {
        &self.query
    }

    /// Body of a fetch or scroll request.
    pub fn search_body(&self) -> Value {
        let mut body = json!({ "query": self.query.compile() });
        if !self.sort.is_empty() {
            body["sort"] = Value::Array(self.sort.iter().map(SortSpec::compile).collect());
        }
        body
    }

    fn search_request(&self, fields: Vec<String>, scroll: Option<Duration>) -> SearchRequest {
        let body = self.search_body();
        debug!(index = M::INDEX, body = %body, "compiled search body");

        SearchRequest {
            body,
            index: M::INDEX.to_string(),
            size: self.limit,
            from: self.offset,
            source_includes: fields,
            scroll,
        }
    }

    /// Raw `_source` of every hit, projected to `fields`.
    pub async fn fetch_fields(&self, fields: &[String]) -> CoreResult<Vec<Value>> {
        let request = self.search_request(fields.to_vec(), None);
        let response = self.transport.search(request).await?;
        hit_sources(&response)
    }

    /// Every hit parsed as `M`.
    pub async fn fetch(&self) -> CoreResult<Vec<M>> {
        let fields = M::default_fields().to_vec();
        self.fetch_fields(&fields)
            .await?
            .into_iter()
            .map(M::parse)
            .collect()
    }

    /// Stream all matches in batches through a scroll cursor.
    ///
    /// The first batch comes from the initial search. Further batches are
    /// requested while both the cursor and the previous batch are non-empty;
    /// the final, possibly empty, batch is yielded before the stream ends. An
    /// error is yielded once and ends the stream.
    pub fn scroll(&self, lifetime: Duration) -> BoxStream<'static, CoreResult<Vec<M>>> {
        let request = self.search_request(M::default_fields().to_vec(), Some(lifetime));
        let transport = Arc::clone(&self.transport);

        stream::unfold(ScrollState::Start(request), move |state| {
            let transport = Arc::clone(&transport);
            async move {
                let response = match state {
                    ScrollState::Done => return None,
                    ScrollState::Start(request) => transport.search(request).await,
                    ScrollState::Next(scroll_id) => transport.scroll(&scroll_id, lifetime).await,
                };

                match response.and_then(|response| scroll_page::<M>(&response)) {
                    Ok((scroll_id, batch)) => {
                        let next = match scroll_id {
                            Some(id) if !id.is_empty() && !batch.is_empty() => {
                                ScrollState::Next(id)
                            }
                            _ => ScrollState::Done,
                        };
                        Some((Ok(batch), next))
                    }
                    Err(err) => Some((Err(err), ScrollState::Done)),
                }
            }
        })
        .boxed()
    }

    /// [`scroll`](Self::scroll) with the session's configured lifetime.
    pub fn scroll_default(&self) -> BoxStream<'static, CoreResult<Vec<M>>> {
        self.scroll(self.scroll_lifetime)
    }

    /// Run an aggregation over the matching documents.
    ///
    /// Returns `None` when the response holds no level 1 aggregation.
    pub async fn aggregate(
        &self,
        aggregation: impl Into<Aggregation>,
    ) -> CoreResult<Option<AggregationResult>> {
        let body = json!({
            "query": self.query.compile(),
            "aggs": aggregation.into().compile(1),
        });
        debug!(index = M::INDEX, body = %body, "compiled aggregation body");

        let request = SearchRequest {
            size: Some(0),
            ..SearchRequest::new(M::INDEX, body)
        };
        let response = self.transport.search(request).await?;

        let aggregations = response
            .get("aggregations")
            .ok_or_else(|| CoreError::malformed("response has no aggregations"))?;
        decode(aggregations, 1)
    }

    /// Approximate number of distinct values of `field`.
    pub async fn unique_count(&self, field: &str) -> CoreResult<u64> {
        self.aggregate(Aggregation::cardinality(field))
            .await?
            .and_then(|result| result.as_u64())
            .ok_or_else(|| CoreError::malformed(format!("cardinality of `{field}` is not a count")))
    }

    /// Sum of `field` over the matching documents.
    pub async fn sum(&self, field: &str) -> CoreResult<f64> {
        self.aggregate(Aggregation::sum(field))
            .await?
            .and_then(|result| result.as_f64())
            .ok_or_else(|| CoreError::malformed(format!("sum of `{field}` is not a number")))
    }

    /// Document count per distinct value of `field`.
    pub async fn group_by(
        &self,
        field: &str,
        max_buckets: u32,
    ) -> CoreResult<IndexMap<String, AggregationResult>> {
        self.aggregate(Terms::new(field, max_buckets))
            .await?
            .and_then(AggregationResult::into_buckets)
            .ok_or_else(|| CoreError::malformed(format!("terms on `{field}` returned no buckets")))
    }

    /// Number of matching documents.
    pub async fn count(&self) -> CoreResult<u64> {
        let body = json!({ "query": self.query.compile() });
        debug!(index = M::INDEX, body = %body, "compiled count body");

        let response = self.transport.count(body, M::INDEX).await?;
        response
            .get("count")
            .and_then(Value::as_u64)
            .ok_or_else(|| CoreError::malformed("count response has no count"))
    }
}

enum ScrollState {
    Start(SearchRequest),
    Next(String),
    Done,
}

fn hit_sources(response: &Value) -> CoreResult<Vec<Value>> {
    let hits = response
        .get("hits")
        .and_then(|hits| hits.get("hits"))
        .and_then(Value::as_array)
        .ok_or_else(|| CoreError::malformed("response has no hits.hits array"))?;
    debug!(count = hits.len(), "raw hits");

    hits.iter()
        .map(|hit| {
            hit.get("_source")
                .cloned()
                .ok_or_else(|| CoreError::malformed("hit has no _source"))
        })
        .collect()
}

fn scroll_page<M: Document>(response: &Value) -> CoreResult<(Option<String>, Vec<M>)> {
    let scroll_id = response
        .get("_scroll_id")
        .and_then(Value::as_str)
        .map(str::to_owned);
    let batch = hit_sources(response)?
        .into_iter()
        .map(M::parse)
        .collect::<CoreResult<Vec<_>>>()?;
    Ok((scroll_id, batch))
}
