//! HTTP transport over the engine's REST API.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::{json, Value};
use tracing::{debug, warn};

use osorm_core::{CoreError, CoreResult, SessionConfig};

use crate::transport::{time_unit, SearchRequest, SearchTransport};

/// reqwest-backed transport rotating over the configured hosts.
pub struct HttpTransport {
    client: Client,
    hosts: Vec<String>,
    next_host: AtomicUsize,
    username: Option<String>,
    password: Option<String>,
}

impl HttpTransport {
    pub fn new(config: &SessionConfig) -> CoreResult<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.request_timeout())
            .gzip(true)
            .build()
            .map_err(CoreError::transport)?;

        Ok(Self {
            client,
            hosts: config
                .hosts
                .iter()
                .map(|host| host.trim_end_matches('/').to_string())
                .collect(),
            next_host: AtomicUsize::new(0),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        let idx = self.next_host.fetch_add(1, Ordering::Relaxed) % self.hosts.len();
        format!("{}/{}", self.hosts[idx], path.trim_start_matches('/'))
    }

    async fn send(&self, mut builder: RequestBuilder) -> CoreResult<Value> {
        if let Some(username) = &self.username {
            builder = builder.basic_auth(username, self.password.as_ref());
        }

        let response = builder.send().await.map_err(CoreError::transport)?;
        let status = response.status();

        if let Err(err) = response.error_for_status_ref().map(|_| ()) {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, body = %body, "search cluster rejected request");
            return Err(CoreError::transport(err));
        }

        response.json::<Value>().await.map_err(CoreError::transport)
    }
}

/// Query-string parameters for a search request.
pub(crate) fn search_params(request: &SearchRequest) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    if let Some(size) = request.size {
        params.push(("size", size.to_string()));
    }
    if let Some(from) = request.from {
        params.push(("from", from.to_string()));
    }
    if !request.source_includes.is_empty() {
        params.push(("_source_includes", request.source_includes.join(",")));
    }
    if let Some(scroll) = request.scroll {
        params.push(("scroll", time_unit(scroll)));
    }
    params
}

#[async_trait]
impl SearchTransport for HttpTransport {
    async fn search(&self, request: SearchRequest) -> CoreResult<Value> {
        let url = self.url(&format!("{}/_search", request.index));
        let params = search_params(&request);
        debug!(url = %url, ?params, "POST search");

        self.send(self.client.post(url).query(&params).json(&request.body))
            .await
    }

    async fn count(&self, body: Value, index: &str) -> CoreResult<Value> {
        let url = self.url(&format!("{index}/_count"));
        debug!(url = %url, "POST count");

        self.send(self.client.post(url).json(&body)).await
    }

    async fn scroll(&self, scroll_id: &str, lifetime: Duration) -> CoreResult<Value> {
        let url = self.url("_search/scroll");
        debug!(url = %url, lifetime = %time_unit(lifetime), "POST scroll");

        let body = json!({
            "scroll": time_unit(lifetime),
            "scroll_id": scroll_id,
        });
        self.send(self.client.post(url).json(&body)).await
    }
}
