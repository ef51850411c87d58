//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with both proxy handlers and a liveness probe
//! - Wire up middleware (request ID, tracing)
//! - Serve on a plain listener or behind TLS
//! - Convert proxy errors into responses at the handler boundary
//! - Record per-request metrics

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{RawQuery, Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use axum_server::tls_rustls::RustlsConfig;
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::{ProxyConfig, HEALTH_PATH};
use crate::http::request::{request_id, MakeRequestUuid, X_REQUEST_ID};
use crate::observability::metrics;
use crate::proxy::{ContentProxy, ProxyError, StreamProxy, UpstreamClient};

/// How long in-flight requests get to finish once shutdown starts (TLS only;
/// plain listeners wait for every connection).
const TLS_DRAIN_SECS: u64 = 10;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub stream: Arc<StreamProxy>,
    pub content: Arc<ContentProxy>,
}

/// HTTP server for the radio proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, reqwest::Error> {
        let client = UpstreamClient::new(&config.timeouts)?;

        let state = AppState {
            stream: Arc::new(StreamProxy::new(&config.stream, client.clone())),
            content: Arc::new(ContentProxy::new(&config.content, client)),
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Upstream timeouts live in the proxies so they surface as proxy errors.
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        let content_mount = config.content.mount.as_str();

        Router::new()
            .route(&config.stream.mount, get(stream_handler))
            .route(content_mount, get(content_handler))
            .route(&format!("{}/", content_mount), get(content_handler))
            .route(&format!("{}/{{*suffix}}", content_mount), get(content_handler))
            .route(HEALTH_PATH, get(health_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::new(X_REQUEST_ID)),
            )
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            stream_mount = %self.config.stream.mount,
            content_mount = %self.config.content.mount,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Run the server behind TLS on `addr` until `shutdown` fires.
    pub async fn run_tls(
        self,
        addr: SocketAddr,
        tls: RustlsConfig,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let handle = axum_server::Handle::new();
        let drain = handle.clone();
        tokio::spawn(async move {
            let _ = shutdown.recv().await;
            tracing::info!("Shutdown signal received");
            drain.graceful_shutdown(Some(Duration::from_secs(TLS_DRAIN_SECS)));
        });

        tracing::info!(address = %addr, "HTTPS server starting");
        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(self.router.into_make_service())
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }
}

/// Audio stream pass-through.
async fn stream_handler(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
    request: Request,
) -> Response {
    let start = Instant::now();
    let result = state.stream.handle(query.as_deref()).await;
    finish("stream", request_id(&request), start, result)
}

/// Broadcaster page and its assets.
async fn content_handler(State(state): State<AppState>, request: Request) -> Response {
    let start = Instant::now();
    let result = state.content.handle(request.uri()).await;
    finish("content", request_id(&request), start, result)
}

fn finish(
    proxy: &'static str,
    request_id: Option<&str>,
    start: Instant,
    result: Result<Response, ProxyError>,
) -> Response {
    let request_id = request_id.unwrap_or("unknown");
    let response = match result {
        Ok(response) => response,
        Err(e) => {
            if e.status().is_server_error() {
                tracing::error!(request_id = %request_id, proxy, kind = e.kind(), error = %e, "Proxy request failed");
            } else {
                tracing::warn!(request_id = %request_id, proxy, kind = e.kind(), error = %e, "Rejected proxy request");
            }
            e.into_response()
        }
    };

    metrics::record_request(proxy, response.status().as_u16(), start);
    response
}

#[derive(Serialize)]
pub struct HealthStatus {
    pub version: &'static str,
    pub status: &'static str,
}

async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthStatus {
            version: env!("CARGO_PKG_VERSION"),
            status: "ok",
        }),
    )
}
