//! HTTP server setup and the proxy handler.
//!
//! # Responsibilities
//! - Create the Axum router for the proxy endpoint
//! - Wire up middleware (request ID, tracing, unlimited bodies)
//! - Run the fetch → rewrite → relay pipeline per request
//! - Record metrics for every request
//! - Serve until the shutdown signal fires

use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::header::HOST;
use axum::http::Request;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::config::{EndpointConfig, ProxyConfig, RewriteConfig};
use crate::http::request::{extract_proxy_request, request_id, MakeRequestUuid};
use crate::http::response::{preflight, relay, ProxyError};
use crate::lifecycle::shutdown;
use crate::observability::metrics;
use crate::rewrite::{rewrite_response, ContentKind, RewriteContext};
use crate::upstream::{FetchError, UpstreamClient};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub client: UpstreamClient,
    pub endpoint: Arc<EndpointConfig>,
    pub rewrite: RewriteConfig,
}

/// HTTP server for the rewriting proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, FetchError> {
        let state = AppState {
            client: UpstreamClient::new(&config.upstream)?,
            endpoint: Arc::new(config.endpoint.clone()),
            rewrite: config.rewrite.clone(),
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        let handler = get(proxy_handler)
            .post(proxy_handler)
            .put(proxy_handler)
            .patch(proxy_handler)
            .delete(proxy_handler)
            .options(preflight_handler);

        // The last layer wraps the others: the ID is set before tracing
        // starts and copied onto the response afterwards.
        Router::new()
            .route(&config.endpoint.path, handler)
            .with_state(state)
            .layer(DefaultBodyLimit::disable())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The configured router, for serving or for in-process tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            endpoint = %self.config.endpoint.path,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown::wait(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn preflight_handler() -> Response {
    preflight()
}

/// Main proxy handler.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let request_id = request_id(request.headers());
    let method = request.method().to_string();
    let inbound_host = request
        .headers()
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| request.uri().authority().map(|a| a.as_str()))
        .map(str::to_string);

    match proxy(&state, request, inbound_host.as_deref(), &request_id).await {
        Ok((response, kind)) => {
            metrics::record_request(&method, response.status().as_u16(), kind.as_str(), start);
            response
        }
        Err(e) => {
            let status = e.status();
            match &e {
                ProxyError::Validation(_) => {
                    tracing::debug!(request_id = %request_id, error = %e, "Rejected request");
                }
                ProxyError::Fetch(fetch) => {
                    metrics::record_upstream_error(fetch.kind());
                    tracing::warn!(
                        request_id = %request_id,
                        kind = fetch.kind(),
                        status = status.as_u16(),
                        error = %e,
                        "Upstream fetch failed"
                    );
                }
            }
            metrics::record_request(&method, status.as_u16(), "error", start);
            e.into_response()
        }
    }
}

async fn proxy(
    state: &AppState,
    request: Request<Body>,
    inbound_host: Option<&str>,
    request_id: &str,
) -> Result<(Response, ContentKind), ProxyError> {
    let proxy_request = extract_proxy_request(request, &state.endpoint.query_param).await?;

    tracing::debug!(
        request_id = %request_id,
        method = %proxy_request.method,
        target = %proxy_request.target,
        "Proxying request"
    );

    let upstream = state.client.fetch(&proxy_request).await?;

    let ctx = RewriteContext::for_endpoint(
        &state.endpoint,
        upstream.final_url.clone(),
        proxy_request.request_url.clone(),
        inbound_host,
    )
    .with_runtime(state.rewrite.inject_runtime);

    let rewritten = rewrite_response(&upstream, &ctx);
    let kind = rewritten.kind;
    metrics::record_rewritten_references(kind.as_str(), rewritten.references);

    tracing::info!(
        request_id = %request_id,
        target = %proxy_request.request_url,
        final_url = %upstream.final_url,
        status = upstream.status.as_u16(),
        content = kind.as_str(),
        references = rewritten.references,
        "Relaying response"
    );

    Ok((relay(&upstream, rewritten), kind))
}
