//! Backend forwarding.
//!
//! # Responsibilities
//! - Rebuild the inbound request against the binding's target
//! - Apply header policy (hop-by-hop, Host, X-Forwarded-*)
//! - Stream request and response bodies without buffering
//! - Classify backend failures
//!
//! # Design Decisions
//! - One pooled hyper client shared by all bindings
//! - No retries and no fallback to another binding
//! - Backend responses, error statuses included, are relayed as-is

use std::net::SocketAddr;
use std::time::Duration;

use axum::body::Body;
use axum::http::header::HOST;
use axum::http::uri::Scheme;
use axum::http::{HeaderValue, Request, Response, Uri};
use hyper::body::Incoming;
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;

use crate::error::{ProxyError, UnavailableReason};
use crate::resilience::timeouts::UpstreamTimeouts;
use crate::routing::Binding;
use crate::security::headers::{append_forwarded, apply_host_policy, strip_hop_by_hop};

/// Relays requests to backends.
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: Client<HttpConnector, Body>,
    timeouts: UpstreamTimeouts,
    forwarded_headers: bool,
}

impl Forwarder {
    /// Create a forwarder with a pooled HTTP/1.1 client.
    pub fn new(timeouts: UpstreamTimeouts, forwarded_headers: bool) -> Self {
        let client = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(Duration::from_secs(30))
            .build(timeouts.connector());

        Self {
            client,
            timeouts,
            forwarded_headers,
        }
    }

    /// Forward `request` to `binding`'s backend at `path_and_query`.
    ///
    /// `client_addr` feeds X-Forwarded-For when enabled. Dropping the returned
    /// future (caller went away) drops the backend request with it.
    pub async fn forward(
        &self,
        request: Request<Body>,
        binding: &Binding,
        path_and_query: &str,
        client_addr: Option<SocketAddr>,
    ) -> Result<Response<Body>, ProxyError> {
        let outbound = self.build_request(request, binding, path_and_query, client_addr)?;

        let response: Response<Incoming> = match self.timeouts.response(self.client.request(outbound)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                let reason = if e.is_connect() {
                    UnavailableReason::Connect
                } else {
                    UnavailableReason::Protocol
                };
                return Err(unavailable(binding, reason, Box::new(e)));
            }
            Err(timed_out) => {
                return Err(unavailable(binding, UnavailableReason::Timeout, Box::new(timed_out)));
            }
        };

        let (mut parts, body) = response.into_parts();
        strip_hop_by_hop(&mut parts.headers);
        Ok(Response::from_parts(parts, Body::new(body)))
    }

    /// Build the outbound request. Method, headers and body carry over.
    pub fn build_request(
        &self,
        request: Request<Body>,
        binding: &Binding,
        path_and_query: &str,
        client_addr: Option<SocketAddr>,
    ) -> Result<Request<Body>, ProxyError> {
        let (parts, body) = request.into_parts();
        let mut headers = parts.headers;

        // HTTP/2 callers carry the host in the URI instead of a header
        let original_host = headers.get(HOST).cloned().or_else(|| {
            parts
                .uri
                .authority()
                .and_then(|a| HeaderValue::from_str(a.as_str()).ok())
        });
        if let Some(host) = &original_host {
            headers.insert(HOST, host.clone());
        }

        strip_hop_by_hop(&mut headers);
        if self.forwarded_headers {
            if let Some(addr) = client_addr {
                append_forwarded(&mut headers, addr.ip(), original_host.as_ref());
            }
        }
        apply_host_policy(&mut headers, binding.target(), binding.change_origin());

        let uri = Uri::builder()
            .scheme(Scheme::HTTP)
            .authority(binding.target().clone())
            .path_and_query(path_and_query)
            .build()?;

        let mut outbound = Request::builder().method(parts.method).uri(uri).body(body)?;
        *outbound.headers_mut() = headers;
        Ok(outbound)
    }
}

fn unavailable(
    binding: &Binding,
    reason: UnavailableReason,
    source: Box<dyn std::error::Error + Send + Sync>,
) -> ProxyError {
    ProxyError::BackendUnavailable {
        service: binding.name().to_string(),
        upstream: binding.target().to_string(),
        reason,
        source: Some(source),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RouterConfig, ServiceConfig};
    use crate::routing::build_route_table;

    fn forwarder(forwarded_headers: bool) -> Forwarder {
        Forwarder::new(
            UpstreamTimeouts {
                connect: Duration::from_secs(1),
                response: Duration::from_secs(1),
            },
            forwarded_headers,
        )
    }

    fn binding(change_origin: bool) -> Binding {
        let mut config = RouterConfig::default();
        let mut service = ServiceConfig::with_target("/api/emissions", "h:4005");
        service.change_origin = Some(change_origin);
        config.services = vec![service];
        build_route_table(&config).unwrap().bindings()[0].clone()
    }

    fn inbound() -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/emissions/summary?year=2024")
            .header("host", "dashboard.local:4000")
            .header("connection", "keep-alive")
            .header("content-type", "application/json")
            .body(Body::from("{}"))
            .unwrap()
    }

    #[tokio::test]
    async fn outbound_uri_and_method() {
        let req = forwarder(false)
            .build_request(inbound(), &binding(true), "/summary?year=2024", None)
            .unwrap();

        assert_eq!(req.method(), "POST");
        assert_eq!(req.uri().to_string(), "http://h:4005/summary?year=2024");
        assert_eq!(req.headers()["content-type"], "application/json");
        assert!(!req.headers().contains_key("connection"));
    }

    #[tokio::test]
    async fn host_follows_change_origin() {
        let changed = forwarder(false)
            .build_request(inbound(), &binding(true), "/summary", None)
            .unwrap();
        assert_eq!(changed.headers()[HOST], "h:4005");

        let kept = forwarder(false)
            .build_request(inbound(), &binding(false), "/summary", None)
            .unwrap();
        assert_eq!(kept.headers()[HOST], "dashboard.local:4000");
    }

    #[tokio::test]
    async fn forwarded_headers_when_enabled() {
        let addr: SocketAddr = "192.168.1.20:51000".parse().unwrap();

        let req = forwarder(true)
            .build_request(inbound(), &binding(true), "/summary", Some(addr))
            .unwrap();
        assert_eq!(req.headers()["x-forwarded-for"], "192.168.1.20");
        assert_eq!(req.headers()["x-forwarded-host"], "dashboard.local:4000");

        let req = forwarder(false)
            .build_request(inbound(), &binding(true), "/summary", Some(addr))
            .unwrap();
        assert!(!req.headers().contains_key("x-forwarded-for"));
    }

    #[tokio::test]
    async fn refused_backend_is_unavailable() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let mut config = RouterConfig::default();
        config.services = vec![ServiceConfig::with_target(
            "/api/noise_assessment",
            format!("127.0.0.1:{port}"),
        )];
        let table = build_route_table(&config).unwrap();
        let binding = &table.bindings()[0];

        let err = forwarder(false)
            .forward(inbound(), binding, "/report", None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProxyError::BackendUnavailable {
                reason: UnavailableReason::Connect,
                ..
            }
        ));
    }
}
