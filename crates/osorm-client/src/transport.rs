use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use osorm_core::CoreResult;

/// Search request handed to the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub body: Value,
    pub index: String,
    /// Page size; `None` leaves the engine default.
    pub size: Option<u64>,
    /// Offset of the first hit.
    pub from: Option<u64>,
    /// `_source` projection; empty means the full source.
    pub source_includes: Vec<String>,
    /// Opens a scroll cursor kept alive for this long.
    pub scroll: Option<Duration>,
}

impl SearchRequest {
    pub fn new(index: impl Into<String>, body: Value) -> Self {
        Self {
            body,
            index: index.into(),
            size: None,
            from: None,
            source_includes: Vec::new(),
            scroll: None,
        }
    }
}

/// Request/response capability of the search cluster.
///
/// Implementations own connectivity, authentication and retries. Errors are
/// reported as [`CoreError::Transport`](osorm_core::CoreError::Transport)
/// and passed to the caller unchanged.
#[async_trait]
pub trait SearchTransport: Send + Sync {
    /// Run a search; returns the raw response (`hits`, `aggregations`, `_scroll_id`).
    async fn search(&self, request: SearchRequest) -> CoreResult<Value>;

    /// Count matching documents; returns `{"count": n, ...}`.
    async fn count(&self, body: Value, index: &str) -> CoreResult<Value>;

    /// Fetch the next page of an open scroll cursor.
    async fn scroll(&self, scroll_id: &str, lifetime: Duration) -> CoreResult<Value>;
}

/// Render a duration as an engine time unit (`30s`, `1500ms`).
///
/// Sub-millisecond parts round up and the result is never below `1ms`, so a
/// scroll cursor cannot be requested with a zero keep-alive.
pub fn time_unit(duration: Duration) -> String {
    if duration.subsec_nanos() == 0 && duration.as_secs() > 0 {
        format!("{}s", duration.as_secs())
    } else {
        let millis = duration.as_nanos().div_ceil(1_000_000).max(1);
        format!("{millis}ms")
    }
}
