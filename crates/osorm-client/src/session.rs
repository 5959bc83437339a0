use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::info;

use osorm_core::{CoreResult, Document, SessionConfig};

use crate::executor::QueryExecutor;
use crate::http::HttpTransport;
use crate::transport::{SearchRequest, SearchTransport};

const DEFAULT_SCROLL_LIFETIME: Duration = Duration::from_secs(60);

/// Handle to a search cluster, shared by every executor it creates.
#[derive(Clone)]
pub struct SearchSession {
    transport: Arc<dyn SearchTransport>,
    scroll_lifetime: Duration,
}

impl SearchSession {
    /// Open a session over HTTP using `config`.
    pub fn connect(config: &SessionConfig) -> CoreResult<Self> {
        let transport = HttpTransport::new(config)?;
        info!(hosts = ?config.hosts, "search session opened");

        Ok(Self {
            transport: Arc::new(transport),
            scroll_lifetime: config.scroll_lifetime(),
        })
    }

    /// Open a session over any transport implementation.
    pub fn with_transport(transport: Arc<dyn SearchTransport>) -> Self {
        Self {
            transport,
            scroll_lifetime: DEFAULT_SCROLL_LIFETIME,
        }
    }

    pub fn with_scroll_lifetime(mut self, lifetime: Duration) -> Self {
        self.scroll_lifetime = lifetime;
        self
    }

    /// Start a query against the index of `M`.
    pub fn select<M: Document>(&self) -> QueryExecutor<M> {
        QueryExecutor::new(Arc::clone(&self.transport), self.scroll_lifetime)
    }

    pub async fn search(&self, request: SearchRequest) -> CoreResult<Value> {
        self.transport.search(request).await
    }

    pub async fn count(&self, body: Value, index: &str) -> CoreResult<Value> {
        self.transport.count(body, index).await
    }

    pub async fn scroll(&self, scroll_id: &str, lifetime: Duration) -> CoreResult<Value> {
        self.transport.scroll(scroll_id, lifetime).await
    }
}
