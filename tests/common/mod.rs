//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    extract::{Path, State},
    http::{HeaderMap, Request, StatusCode},
    response::IntoResponse,
    routing::any,
    Json, Router,
};
use dashboard_router::config::{RouterConfig, ServiceConfig};
use dashboard_router::lifecycle::{startup, Shutdown};
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// A running mock backend.
#[allow(dead_code)]
pub struct MockBackend {
    pub addr: SocketAddr,
    pub hits: Arc<AtomicUsize>,
    pub finished: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl MockBackend {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// Slow handlers that ran to completion.
    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }
}

#[derive(Clone)]
struct BackendState {
    label: &'static str,
    hits: Arc<AtomicUsize>,
    finished: Arc<AtomicUsize>,
}

/// Start a backend that echoes what it received as JSON.
///
/// - `/status/{code}` answers with that status
/// - `/slow/{millis}` waits before answering
/// - `/hop-by-hop` answers with connection-scoped headers
/// - anything else echoes method, URI, Host, body and selected headers
pub async fn start_echo_backend(label: &'static str) -> MockBackend {
    let hits = Arc::new(AtomicUsize::new(0));
    let finished = Arc::new(AtomicUsize::new(0));
    let state = BackendState {
        label,
        hits: hits.clone(),
        finished: finished.clone(),
    };

    let app = Router::new()
        .route("/status/{code}", any(status))
        .route("/slow/{millis}", any(slow))
        .route("/hop-by-hop", any(hop_by_hop))
        .fallback(echo)
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockBackend {
        addr,
        hits,
        finished,
    }
}

async fn echo(State(state): State<BackendState>, request: Request<Body>) -> Json<Value> {
    state.hits.fetch_add(1, Ordering::SeqCst);
    let (parts, body) = request.into_parts();
    let body = to_bytes(body, 1024 * 1024).await.unwrap_or_default();
    let header = |name: &str| {
        parts
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    Json(json!({
        "backend": state.label,
        "method": parts.method.as_str(),
        "uri": parts.uri.to_string(),
        "host": header("host"),
        "x_request_id": header("x-request-id"),
        "x_forwarded_for": header("x-forwarded-for"),
        "connection_listed": header("x-drop-me"),
        "body": String::from_utf8_lossy(&body),
    }))
}

async fn status(State(state): State<BackendState>, Path(code): Path<u16>) -> impl IntoResponse {
    state.hits.fetch_add(1, Ordering::SeqCst);
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut headers = HeaderMap::new();
    headers.insert("x-backend", state.label.parse().unwrap());
    (status, headers, format!("{} says {}", state.label, code))
}

async fn slow(State(state): State<BackendState>, Path(millis): Path<u64>) -> String {
    state.hits.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(millis)).await;
    state.finished.fetch_add(1, Ordering::SeqCst);
    format!("{} was slow", state.label)
}

async fn hop_by_hop(State(state): State<BackendState>) -> impl IntoResponse {
    state.hits.fetch_add(1, Ordering::SeqCst);
    let mut headers = HeaderMap::new();
    headers.insert("connection", "x-secret".parse().unwrap());
    headers.insert("x-secret", "1".parse().unwrap());
    headers.insert("keep-alive", "timeout=5".parse().unwrap());
    headers.insert("x-kept", "yes".parse().unwrap());
    (headers, format!("{} sent hop-by-hop headers", state.label))
}

/// A loopback port with nothing listening on it.
#[allow(dead_code)]
pub fn refused_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Config routing each `(prefix, addr)` pair to a literal target.
pub fn literal_config(services: &[(&str, SocketAddr)]) -> RouterConfig {
    RouterConfig {
        services: services
            .iter()
            .map(|(prefix, addr)| ServiceConfig::with_target(*prefix, addr.to_string()))
            .collect(),
        ..RouterConfig::default()
    }
}

/// Start the router on an ephemeral port.
pub async fn start_router(config: RouterConfig) -> (SocketAddr, Shutdown) {
    let server = startup::prepare(&config).await.unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let shutdown_rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, shutdown_rx).await;
    });

    (addr, shutdown)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
