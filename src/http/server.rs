//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Create the Axum router with the proxy handler as fallback
//! - Wire up middleware (request ID, tracing)
//! - Dispatch requests through matcher, rewriter and forwarder
//! - Turn request-time errors into responses without stopping the server

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    response::{IntoResponse, Response},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::config::RouterConfig;
use crate::error::ProxyError;
use crate::http::forward::Forwarder;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer, RequestIdExt};
use crate::lifecycle::shutdown;
use crate::observability::metrics;
use crate::resilience::timeouts::UpstreamTimeouts;
use crate::routing::{rewrite_path_and_query, RouteTable};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub table: Arc<RouteTable>,
    pub forwarder: Forwarder,
}

/// HTTP server for the router.
pub struct HttpServer {
    router: Router,
    table: Arc<RouteTable>,
}

impl HttpServer {
    /// Create a server for an already-built route table.
    pub fn new(table: RouteTable, config: &RouterConfig) -> Self {
        let table = Arc::new(table);
        let forwarder = Forwarder::new(
            UpstreamTimeouts::from(&config.timeouts),
            config.upstream.forwarded_headers,
        );

        let state = AppState {
            table: table.clone(),
            forwarder,
        };

        Self {
            router: Self::build_router(state),
            table,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .fallback(proxy_handler)
            .with_state(state)
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    /// The routes this server dispatches to.
    pub fn route_table(&self) -> &RouteTable {
        &self.table
    }

    /// The underlying Axum router, for in-process testing.
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Serve on `listener` until `shutdown_rx` fires, then drain.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.table.len(),
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown::wait(shutdown_rx))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Main proxy handler.
/// Matches the path, rewrites it, and forwards to the owning backend.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request.request_id().to_string();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    // 1. Match route
    let Some(binding) = state.table.match_path(&path) else {
        tracing::warn!(request_id = %request_id, method = %method, path = %path, "No route matched");
        metrics::record_request(method.as_str(), 404, "none", start_time);
        return ProxyError::NotFound { path }.into_response();
    };

    // 2. Rewrite
    let upstream_path = rewrite_path_and_query(request.uri(), binding);
    let client_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        service = binding.name(),
        upstream = %binding.target(),
        upstream_path = %upstream_path,
        "Forwarding request"
    );

    // 3. Forward
    match state
        .forwarder
        .forward(request, binding, &upstream_path, client_addr)
        .await
    {
        Ok(response) => {
            let status = response.status();
            metrics::record_request(method.as_str(), status.as_u16(), binding.name(), start_time);
            tracing::info!(
                request_id = %request_id,
                method = %method,
                path = %path,
                service = binding.name(),
                status = status.as_u16(),
                elapsed_ms = start_time.elapsed().as_millis() as u64,
                "Request proxied"
            );
            response
        }
        Err(err) => {
            let status = err.status();
            if let ProxyError::BackendUnavailable { reason, .. } = &err {
                metrics::record_backend_error(binding.name(), &reason.to_string());
            }
            metrics::record_request(method.as_str(), status.as_u16(), binding.name(), start_time);
            tracing::error!(
                request_id = %request_id,
                method = %method,
                path = %path,
                service = binding.name(),
                upstream = %binding.target(),
                error = %err,
                "Upstream request failed"
            );
            err.into_response()
        }
    }
}
