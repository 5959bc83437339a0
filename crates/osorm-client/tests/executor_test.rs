//! Integration tests for query execution
//!
//! Runs executors against an in-memory transport that replays canned
//! responses and records every request it receives.

use std::collections::VecDeque;
use std::error::Error as _;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use serde::Deserialize;
use serde_json::{json, Value};

use osorm_client::{SearchRequest, SearchSession, SearchTransport};
use osorm_core::{CoreError, CoreResult, Document, FieldSet};
use osorm_query::{Aggregation, AggregationResult, Expression};

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct AccessLog {
    status: String,
    path: String,
    latency_ms: u64,
}

impl Document for AccessLog {
    const INDEX: &'static str = "access-log";

    fn default_fields() -> FieldSet {
        FieldSet::new(["status", "path", "latency_ms"])
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Search(SearchRequest),
    Count { body: Value, index: String },
    Scroll { scroll_id: String, lifetime: Duration },
}

#[derive(Default)]
struct MockTransport {
    responses: Mutex<VecDeque<CoreResult<Value>>>,
    calls: Mutex<Vec<Call>>,
}

impl MockTransport {
    fn replying(responses: Vec<CoreResult<Value>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn next(&self, call: Call) -> CoreResult<Value> {
        self.calls.lock().unwrap().push(call);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected request")
    }
}

#[async_trait]
impl SearchTransport for MockTransport {
    async fn search(&self, request: SearchRequest) -> CoreResult<Value> {
        self.next(Call::Search(request))
    }

    async fn count(&self, body: Value, index: &str) -> CoreResult<Value> {
        self.next(Call::Count {
            body,
            index: index.to_string(),
        })
    }

    async fn scroll(&self, scroll_id: &str, lifetime: Duration) -> CoreResult<Value> {
        self.next(Call::Scroll {
            scroll_id: scroll_id.to_string(),
            lifetime,
        })
    }
}

fn session(transport: &Arc<MockTransport>) -> SearchSession {
    SearchSession::with_transport(Arc::clone(transport) as Arc<dyn SearchTransport>)
}

fn hit(status: &str, path: &str, latency_ms: u64) -> Value {
    json!({"_index": "access-log", "_source": {"status": status, "path": path, "latency_ms": latency_ms}})
}

fn hits_page(scroll_id: Option<&str>, hits: Vec<Value>) -> Value {
    let mut page = json!({"hits": {"hits": hits}});
    if let Some(id) = scroll_id {
        page["_scroll_id"] = json!(id);
    }
    page
}

fn empty_bool() -> Value {
    json!({"bool": {"must_not": [], "should": [], "filter": [], "minimum_should_match": 0}})
}

/// Fetch projects the model fields and parses every hit
#[tokio::test]
async fn test_fetch_parses_documents() {
    let transport = MockTransport::replying(vec![Ok(hits_page(
        None,
        vec![hit("200", "/", 12), hit("404", "/missing", 3)],
    ))]);

    let docs = session(&transport)
        .select::<AccessLog>()
        .filter_by("latency_ms__lt", 100)
        .unwrap()
        .limit(10)
        .offset(20)
        .fetch()
        .await
        .unwrap();

    assert_eq!(docs.len(), 2);
    assert_eq!(docs[1].path, "/missing");

    let calls = transport.calls();
    assert_eq!(calls.len(), 1);
    let Call::Search(request) = &calls[0] else {
        panic!("expected search, got {:?}", calls[0]);
    };
    assert_eq!(request.index, "access-log");
    assert_eq!(request.size, Some(10));
    assert_eq!(request.from, Some(20));
    assert_eq!(request.scroll, None);
    assert_eq!(request.source_includes, vec!["status", "path", "latency_ms"]);
    assert_eq!(
        request.body,
        json!({"query": {"bool": {
            "must_not": [],
            "should": [],
            "filter": [{"range": {"latency_ms": {"lt": 100}}}],
            "minimum_should_match": 0
        }}})
    );
}

/// Sort keys are emitted only when present
#[tokio::test]
async fn test_fetch_fields_with_sort() {
    let transport = MockTransport::replying(vec![Ok(hits_page(
        None,
        vec![json!({"_source": {"path": "/a"}})],
    ))]);

    let sources = session(&transport)
        .select::<AccessLog>()
        .sort_by(["-latency_ms", "path"])
        .fetch_fields(&["path".to_string()])
        .await
        .unwrap();
    assert_eq!(sources, vec![json!({"path": "/a"})]);

    let calls = transport.calls();
    let Call::Search(request) = &calls[0] else {
        panic!("expected search");
    };
    assert_eq!(request.source_includes, vec!["path"]);
    assert_eq!(request.body["sort"], json!([{"latency_ms": "desc"}, {"path": "asc"}]));
    assert_eq!(request.body["query"], empty_bool());
}

/// A source that does not fit the model is a shape error
#[tokio::test]
async fn test_fetch_shape_error() {
    let transport = MockTransport::replying(vec![Ok(hits_page(
        None,
        vec![json!({"_source": {"status": 200}})],
    ))]);

    let err = session(&transport)
        .select::<AccessLog>()
        .fetch()
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Shape(_)));
}

/// Validation fails before anything is sent
#[tokio::test]
async fn test_unknown_field_sends_nothing() {
    let transport = MockTransport::replying(vec![]);

    let search = session(&transport);
    let mut executor = search.select::<AccessLog>();
    let result = executor.union_by("host__prefix", "web");
    assert!(matches!(result, Err(CoreError::UnknownField { .. })));
    assert!(transport.calls().is_empty());
}

/// A rejected clause keeps the query, pagination and sort keys
#[tokio::test]
async fn test_rejected_clause_keeps_executor_state() {
    let transport = MockTransport::replying(vec![Ok(hits_page(None, vec![]))]);
    let search = session(&transport);

    let mut executor = search.select::<AccessLog>();
    executor
        .filter_by("status", "200")
        .unwrap()
        .limit(5)
        .offset(10)
        .sort_by(["-latency_ms"]);
    let body_before = executor.search_body();

    let err = executor.exclude_by("path__contains", "/admin").unwrap_err();
    assert!(matches!(err, CoreError::InvalidClause { .. }));
    assert_eq!(executor.search_body(), body_before);

    executor.fetch().await.unwrap();
    let calls = transport.calls();
    let Call::Search(request) = &calls[0] else {
        panic!("expected search");
    };
    assert_eq!(request.size, Some(5));
    assert_eq!(request.from, Some(10));
    assert_eq!(request.body["sort"], json!([{"latency_ms": "desc"}]));
    assert_eq!(
        request.body["query"]["bool"]["filter"],
        json!([{"match_phrase": {"status": "200"}}])
    );
    assert_eq!(request.body["query"]["bool"]["must_not"], json!([]));
}

/// Transport errors reach the caller unchanged
#[tokio::test]
async fn test_transport_error_propagates() {
    let refused = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused");
    let transport = MockTransport::replying(vec![Err(CoreError::transport(refused))]);

    let err = session(&transport)
        .select::<AccessLog>()
        .count()
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::Transport(_)));
    let source = err.source().unwrap();
    assert_eq!(
        source.downcast_ref::<std::io::Error>().map(|e| e.kind()),
        Some(std::io::ErrorKind::ConnectionRefused)
    );
}

/// Count sends only the query
#[tokio::test]
async fn test_count() {
    let transport = MockTransport::replying(vec![Ok(json!({"count": 17, "_shards": {}}))]);

    let count = session(&transport)
        .select::<AccessLog>()
        .exclude_by("status", "500")
        .unwrap()
        .count()
        .await
        .unwrap();
    assert_eq!(count, 17);

    assert_eq!(
        transport.calls(),
        vec![Call::Count {
            body: json!({"query": {"bool": {
                "must_not": [{"match_phrase": {"status": "500"}}],
                "should": [],
                "filter": [],
                "minimum_should_match": 0
            }}}),
            index: "access-log".to_string(),
        }]
    );
}

/// Aggregations are sent with size 0 and decoded from depth 1
#[tokio::test]
async fn test_aggregate_nested_terms() {
    let transport = MockTransport::replying(vec![Ok(json!({
        "hits": {"hits": []},
        "aggregations": {
            "1": {"buckets": [
                {"key": "200", "doc_count": 5, "2": {"value": 3}},
                {"key": "404", "doc_count": 2, "2": {"value": 1}}
            ]}
        }
    }))]);

    let result = session(&transport)
        .select::<AccessLog>()
        .filter(
            [Expression::wildcard("path", "/api/*")],
            std::iter::empty::<(String, Value)>(),
        )
        .unwrap()
        .aggregate(Aggregation::terms("status", 10).nested(Aggregation::cardinality("path")))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(result.get("200").and_then(AggregationResult::as_u64), Some(3));
    assert_eq!(result.get("404").and_then(AggregationResult::as_u64), Some(1));

    let calls = transport.calls();
    let Call::Search(request) = &calls[0] else {
        panic!("expected search");
    };
    assert_eq!(request.size, Some(0));
    assert!(request.source_includes.is_empty());
    assert_eq!(
        request.body["aggs"],
        json!({"1": {
            "terms": {"field": "status", "size": 10},
            "aggs": {"2": {"cardinality": {"field": "path"}}}
        }})
    );
    assert_eq!(
        request.body["query"]["bool"]["filter"],
        json!([{"wildcard": {"path": "/api/*"}}])
    );
}

/// Metric and terms shortcuts
#[tokio::test]
async fn test_aggregation_shortcuts() {
    let transport = MockTransport::replying(vec![
        Ok(json!({"aggregations": {"1": {"value": 42}}})),
        Ok(json!({"aggregations": {"1": {"value": 1536.5}}})),
        Ok(json!({"aggregations": {"1": {"buckets": [
            {"key": "200", "doc_count": 9},
            {"key": "500", "doc_count": 1}
        ]}}})),
    ]);
    let search = session(&transport);
    let executor = search.select::<AccessLog>();

    assert_eq!(executor.unique_count("path").await.unwrap(), 42);
    assert_eq!(executor.sum("latency_ms").await.unwrap(), 1536.5);

    let groups = executor.group_by("status", 5).await.unwrap();
    assert_eq!(groups.keys().collect::<Vec<_>>(), vec!["200", "500"]);
    assert_eq!(groups["200"], AggregationResult::Count(9));

    let calls = transport.calls();
    let Call::Search(terms) = &calls[2] else {
        panic!("expected search");
    };
    assert_eq!(
        terms.body["aggs"],
        json!({"1": {"terms": {"field": "status", "size": 5}, "aggs": {}}})
    );
}

/// Scroll yields every batch, including the final empty one
#[tokio::test]
async fn test_scroll_until_empty_batch() {
    let transport = MockTransport::replying(vec![
        Ok(hits_page(Some("c1"), vec![hit("200", "/a", 1), hit("200", "/b", 2)])),
        Ok(hits_page(Some("c2"), vec![hit("404", "/c", 3)])),
        Ok(hits_page(Some("c3"), vec![])),
    ]);
    let lifetime = Duration::from_secs(30);

    let batches: Vec<_> = session(&transport)
        .select::<AccessLog>()
        .scroll(lifetime)
        .collect()
        .await;

    let sizes: Vec<usize> = batches
        .into_iter()
        .map(|batch| batch.unwrap().len())
        .collect();
    assert_eq!(sizes, vec![2, 1, 0]);

    let calls = transport.calls();
    assert_eq!(calls.len(), 3);
    let Call::Search(request) = &calls[0] else {
        panic!("expected search");
    };
    assert_eq!(request.scroll, Some(lifetime));
    assert_eq!(
        calls[1..],
        [
            Call::Scroll {
                scroll_id: "c1".to_string(),
                lifetime
            },
            Call::Scroll {
                scroll_id: "c2".to_string(),
                lifetime
            },
        ]
    );
}

/// Scroll ends when the engine returns no cursor
#[tokio::test]
async fn test_scroll_stops_without_cursor() {
    let transport = MockTransport::replying(vec![Ok(hits_page(None, vec![hit("200", "/", 1)]))]);

    let mut stream = session(&transport)
        .with_scroll_lifetime(Duration::from_secs(5))
        .select::<AccessLog>()
        .scroll_default();

    let first = stream.next().await.unwrap().unwrap();
    assert_eq!(first.len(), 1);
    assert!(stream.next().await.is_none());
    assert_eq!(transport.calls().len(), 1);
}

/// A failing page is yielded once and ends the stream
#[tokio::test]
async fn test_scroll_error_ends_stream() {
    let timeout = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
    let transport = MockTransport::replying(vec![
        Ok(hits_page(Some("c1"), vec![hit("200", "/", 1)])),
        Err(CoreError::transport(timeout)),
    ]);

    let results: Vec<_> = session(&transport)
        .select::<AccessLog>()
        .scroll(Duration::from_secs(1))
        .collect()
        .await;

    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(CoreError::Transport(_))));
}
