//! Shared test harness for integration tests.
//!
//! [`TestHarness`] starts a `wiremock` server standing in for the upstream
//! metadata API and builds a full gateway + catalog stack pointed at it. The
//! [`TestHarness::with_server`] constructor also serves the Axum router on a
//! random port for HTTP-level testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use reelgate::catalog::Catalog;
use reelgate::config::{Config, GovernorConfig, QueueConfig, UpstreamConfig};
use reelgate::gateway::Gateway;
use reelgate::server::{create_router, AppContext};
use wiremock::MockServer;

pub const API_KEY: &str = "test-key";

/// Upstream mock plus a fully wired [`AppContext`].
pub struct TestHarness {
    pub upstream: MockServer,
    pub ctx: AppContext,
}

impl TestHarness {
    /// Harness with fast pacing so tests do not wait on production delays.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Harness whose config is adjusted by `tweak` after pointing it at the mock.
    pub async fn with_config(tweak: impl FnOnce(&mut Config)) -> Self {
        let upstream = MockServer::start().await;
        let mut config = fast_config(&upstream.uri());
        tweak(&mut config);

        let gateway = Arc::new(Gateway::from_config(&config));
        let catalog = Arc::new(Catalog::new(gateway, config.ttl_policy().clone()));

        Self {
            upstream,
            ctx: AppContext::new(catalog),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.ctx.catalog
    }

    /// Start an Axum server on a random port and return the harness together
    /// with the bound socket address.
    pub async fn with_server() -> (Self, SocketAddr) {
        let harness = Self::new().await;
        let app = create_router(harness.ctx.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (harness, addr)
    }
}

/// Defaults scaled down: 10ms spacing and 20/40ms backoff.
pub fn fast_config(base_url: &str) -> Config {
    Config {
        upstream: UpstreamConfig {
            base_url: base_url.to_string(),
            api_key: API_KEY.to_string(),
            timeout_ms: 1000,
            ..UpstreamConfig::default()
        },
        governor: GovernorConfig {
            min_interval_ms: 10,
            backoff_base_ms: 20,
            backoff_max_ms: 40,
            ..GovernorConfig::default()
        },
        queue: QueueConfig {
            batch_yield_ms: 5,
            ..QueueConfig::default()
        },
        ..Config::default()
    }
}

/// Listing/search envelope with `n` trivial results.
pub fn page_body(page: u32, n: usize) -> serde_json::Value {
    serde_json::json!({
        "page": page,
        "total_pages": 10,
        "total_results": 200,
        "results": (0..n).map(|i| serde_json::json!({"id": i})).collect::<Vec<_>>(),
    })
}
