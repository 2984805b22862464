//! JSON HTTP API over the catalog.

use crate::catalog::Catalog;
use crate::config::Config;
use crate::gateway::Gateway;
use anyhow::{Context, Result};
use axum::{
    http::{header, Method},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod error;
pub mod routes;

pub use error::ApiError;

/// Shared application context
#[derive(Clone)]
pub struct AppContext {
    pub catalog: Arc<Catalog>,
}

impl AppContext {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    /// Build the full gateway and catalog stack from configuration.
    pub fn from_config(config: &Config) -> Self {
        let gateway = Arc::new(Gateway::from_config(config));
        Self::new(Arc::new(Catalog::new(gateway, config.ttl_policy().clone())))
    }
}

/// Create the Axum router with all routes
pub fn create_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", routes::api_routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Start the HTTP server and run until Ctrl+C or SIGTERM.
pub async fn start_server(config: Config) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let ctx = AppContext::from_config(&config);
    let app = create_router(ctx);

    tracing::info!(
        environment = %config.environment,
        upstream = %config.upstream.base_url,
        "Starting server on {}",
        addr
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::tests::ScriptedTransport;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn router(transport: Arc<ScriptedTransport>) -> Router {
        let config = Config::default();
        let gateway = Arc::new(Gateway::new(&config, transport));
        let catalog = Arc::new(Catalog::new(gateway, config.ttl_policy().clone()));
        create_router(AppContext::new(catalog))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn health_reports_version() {
        let (status, body) =
            get_json(router(Arc::new(ScriptedTransport::default())), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn list_route_returns_page() {
        let transport = Arc::new(ScriptedTransport::default());
        transport.respond(
            "/movie/now_playing",
            json!({"page": 2, "total_pages": 4, "total_results": 80, "results": [{"id": 1}]}),
        );

        let (status, body) = get_json(router(transport), "/api/list/now-playing?page=2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["page"], 2);
        assert_eq!(body["results"][0]["id"], 1);
    }

    #[tokio::test]
    async fn unknown_category_is_400() {
        let transport = Arc::new(ScriptedTransport::default());
        let (status, body) = get_json(router(transport.clone()), "/api/list/blockbusters").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "validation_error");
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn blank_search_is_400() {
        let (status, body) = get_json(
            router(Arc::new(ScriptedTransport::default())),
            "/api/search?query=%20%20",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "validation_error");
    }

    #[tokio::test]
    async fn missing_title_is_404() {
        let (status, body) = get_json(
            router(Arc::new(ScriptedTransport::default())),
            "/api/details/movie/42",
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "not_found");
    }

    #[tokio::test]
    async fn non_numeric_id_is_400() {
        let (status, _) = get_json(
            router(Arc::new(ScriptedTransport::default())),
            "/api/details/tv/abc",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
