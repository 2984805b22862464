//! Rate-limited, cached gateway to the upstream metadata API.
//!
//! Every upstream call flows through one explicit pipeline:
//!
//! 1. [`cache`] -- a fresh entry for the request's logical key returns
//!    immediately with no upstream traffic.
//! 2. [`queue`] -- misses are enqueued and released in batches.
//! 3. [`governor`] -- each release is spaced from the previous dispatch;
//!    429 responses are retried with bounded exponential backoff.
//! 4. [`transport`] -- the HTTP call itself, under a fixed timeout.
//!
//! Successful responses are stored back into the cache. [`Gateway`] is the
//! only place transport failures are converted into [`reelgate_core::Error`].

pub mod cache;
pub mod governor;
pub mod queue;
pub mod transport;

use std::sync::Arc;
use std::time::Duration;

use reelgate_core::{Error, RequestSpec, Result};
use serde::Serialize;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub use cache::ResponseCache;
pub use governor::{DispatchError, RateGovernor, RetryState};
pub use queue::{Admission, RequestQueue};
pub use transport::{HttpTransport, Transport, TransportError};

use crate::config::Config;

/// Point-in-time counters for the gateway.
#[derive(Debug, Clone, Serialize)]
pub struct GatewayStats {
    pub cache_entries: usize,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub queue_pending: usize,
    pub upstream_dispatches: u64,
    pub throttled_retries: u64,
}

/// Single entry point for upstream calls.
///
/// Construct one per process and share it behind an `Arc`; it owns its queue,
/// governor and cache, so nothing is hidden in globals.
pub struct Gateway {
    cache: Arc<ResponseCache>,
    queue: RequestQueue,
    governor: Arc<RateGovernor>,
    transport: Arc<dyn Transport>,
    sweeper: Option<JoinHandle<()>>,
}

impl Gateway {
    /// Build a gateway over an arbitrary transport.
    ///
    /// Starts the cache sweeper, so this must run inside a Tokio runtime.
    pub fn new(config: &Config, transport: Arc<dyn Transport>) -> Self {
        let cache = Arc::new(ResponseCache::new(config.cache.max_entries));
        let governor = Arc::new(RateGovernor::new(config.governor.clone()));
        let queue = RequestQueue::new(config.queue.clone(), governor.clone());
        let sweeper = cache::start_sweeper_task(
            cache.clone(),
            Duration::from_secs(config.cache.sweep_interval_secs.max(1)),
        );

        Self {
            cache,
            queue,
            governor,
            transport,
            sweeper: Some(sweeper),
        }
    }

    /// Build a gateway talking HTTP to the configured upstream.
    pub fn from_config(config: &Config) -> Self {
        let transport = Arc::new(HttpTransport::new(&config.upstream));
        Self::new(config, transport)
    }

    /// Fetch `spec`, serving from cache while fresh and storing successful
    /// responses for `ttl`.
    pub async fn fetch(&self, spec: RequestSpec, ttl: Duration) -> Result<Value> {
        let key = spec.cache_key();

        if let Some(value) = self.cache.get(&key) {
            debug!(key = %key, "Cache hit");
            return Ok(value);
        }
        debug!(key = %key, "Cache miss; queueing upstream request");

        let spec = self.queue.enqueue(spec).admitted().await?;

        let transport = &self.transport;
        let value = self
            .governor
            .execute(|| transport.send(&spec))
            .await
            .map_err(|e| {
                let err = into_error(&spec, e);
                warn!(key = %key, error = %err, "Upstream request failed");
                err
            })?;

        self.cache.set(&key, value.clone(), ttl);
        Ok(value)
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn stats(&self) -> GatewayStats {
        GatewayStats {
            cache_entries: self.cache.len(),
            cache_hits: self.cache.hits(),
            cache_misses: self.cache.misses(),
            queue_pending: self.queue.pending(),
            upstream_dispatches: self.governor.dispatch_count(),
            throttled_retries: self.governor.throttled_retry_count(),
        }
    }
}

impl Drop for Gateway {
    fn drop(&mut self) {
        if let Some(sweeper) = self.sweeper.take() {
            sweeper.abort();
        }
    }
}

/// Translate a governed transport failure into the caller-facing taxonomy.
fn into_error(spec: &RequestSpec, err: DispatchError) -> Error {
    match err {
        DispatchError::Exhausted { attempts } => Error::RateLimited { attempts },
        DispatchError::Transport(TransportError::TooManyRequests) => {
            Error::RateLimited { attempts: 1 }
        }
        DispatchError::Transport(TransportError::Timeout(after)) => {
            Error::Timeout(format!("{} after {:?}", spec.path, after))
        }
        // The body is logged by the transport and never reaches callers.
        DispatchError::Transport(TransportError::Status { status, .. }) => {
            let message = if status == 404 {
                format!("{} not found", spec.path)
            } else {
                format!("{} returned {status}", spec.path)
            };
            Error::upstream(Some(status), message)
        }
        DispatchError::Transport(TransportError::Connect(msg)) => {
            Error::upstream(None, format!("{}: {msg}", spec.path))
        }
        DispatchError::Transport(TransportError::Decode(msg)) => {
            Error::upstream(None, format!("{}: invalid response: {msg}", spec.path))
        }
    }
}
