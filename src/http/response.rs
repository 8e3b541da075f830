//! Error responses.
//!
//! # Responsibilities
//! - Map request-time errors to HTTP status codes
//! - Keep backend responses untouched (handled in forward.rs)
//!
//! # Design Decisions
//! - Routing miss → 404, backend unreachable or timed out → 502
//! - Plain-text bodies; the caller is a browser dev session

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::error::ProxyError;

impl ProxyError {
    /// Status code presented to the caller.
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::NotFound { .. } => StatusCode::NOT_FOUND,
            ProxyError::BackendUnavailable { .. } | ProxyError::Request(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let body = match &self {
            ProxyError::NotFound { path } => format!("No route for {}", path),
            ProxyError::BackendUnavailable { service, upstream, .. } => {
                format!("Backend {} ({}) is unavailable", service, upstream)
            }
            ProxyError::Request(_) => "Upstream request could not be built".to_string(),
        };
        (self.status(), body).into_response()
    }
}
