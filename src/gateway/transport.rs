//! Upstream transport: the only code that talks HTTP.
//!
//! [`Transport`] is the seam the gateway dispatches through; [`HttpTransport`]
//! is the reqwest-backed implementation used in production. Failures are
//! reported as [`TransportError`] so the gateway can tell throttling and
//! timeouts apart from everything else.

use std::time::Duration;

use async_trait::async_trait;
use reelgate_core::RequestSpec;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::UpstreamConfig;

/// Raw failure shapes reported by a transport.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    /// Upstream answered 429.
    #[error("upstream returned 429 Too Many Requests")]
    TooManyRequests,

    /// The request exceeded its deadline or the connection was aborted.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Upstream answered with some other non-success status.
    #[error("upstream returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The request never produced a response.
    #[error("connection failed: {0}")]
    Connect(String),

    /// The response body was not valid JSON.
    #[error("invalid response body: {0}")]
    Decode(String),
}

/// Executes a single upstream GET and returns the decoded JSON body.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, spec: &RequestSpec) -> Result<Value, TransportError>;
}

/// reqwest-backed transport with a fixed base URL and shared credentials.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    language: String,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(config: &UpstreamConfig) -> Self {
        let timeout = config.timeout();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(config.max_idle_connections)
            .build()
            .unwrap_or_else(|e| {
                warn!("Failed to build HTTP client with timeout: {}", e);
                reqwest::Client::new()
            });

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            language: config.language.clone(),
            timeout,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Map a reqwest failure, dropping the request URL since its query
    /// string carries the API key.
    fn classify(&self, err: reqwest::Error) -> TransportError {
        let err = err.without_url();
        if err.is_timeout() {
            TransportError::Timeout(self.timeout)
        } else if err.is_decode() {
            TransportError::Decode(err.to_string())
        } else {
            TransportError::Connect(err.to_string())
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, spec: &RequestSpec) -> Result<Value, TransportError> {
        let mut query: Vec<(&str, &str)> = vec![
            ("api_key", self.api_key.as_str()),
            ("language", self.language.as_str()),
        ];
        query.extend(spec.params.iter().map(|(k, v)| (k.as_str(), v.as_str())));

        debug!(path = %spec.path, "Sending upstream request");

        let resp = self
            .client
            .get(self.url(&spec.path))
            .query(&query)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = resp
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned);
            debug!(path = %spec.path, retry_after = ?retry_after, "Upstream throttled request");
            return Err(TransportError::TooManyRequests);
        }

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            debug!(
                path = %spec.path,
                status = status.as_u16(),
                body = %body_snippet(&body),
                "Upstream returned error status"
            );
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        resp.json::<Value>().await.map_err(|e| self.classify(e))
    }
}

fn body_snippet(body: &str) -> String {
    const LIMIT: usize = 200;
    if body.chars().count() <= LIMIT {
        body.to_string()
    } else {
        let mut out: String = body.chars().take(LIMIT).collect();
        out.push_str("...");
        out
    }
}
