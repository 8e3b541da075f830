//! Error taxonomy for the router.
//!
//! # Design Decisions
//! - `ConfigurationError` is fatal and only produced before serving
//! - `ProxyError` is produced per request and always becomes a response
//! - Neither type is ever retried against another binding

use thiserror::Error;

use crate::config::validation::ValidationError;

/// Errors that prevent the router from starting.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {var}: {value:?}")]
    Env { var: &'static str, value: String },

    #[error("invalid configuration: {}", join_errors(.0))]
    Invalid(Vec<ValidationError>),

    #[error("cannot resolve target {authority} for {prefix}: {reason}")]
    Unresolvable {
        prefix: String,
        authority: String,
        reason: String,
    },
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Why a backend could not be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnavailableReason {
    /// Connect failed (refused, reset, unreachable).
    Connect,
    /// No response head within the configured deadline.
    Timeout,
    /// The connection broke after it was established.
    Protocol,
}

impl std::fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnavailableReason::Connect => write!(f, "connect failed"),
            UnavailableReason::Timeout => write!(f, "timed out"),
            UnavailableReason::Protocol => write!(f, "connection error"),
        }
    }
}

/// Request-time failures.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// No binding owns the request path.
    #[error("no route for {path}")]
    NotFound { path: String },

    /// The owning backend could not be reached.
    #[error("backend {service} at {upstream} unavailable: {reason}")]
    BackendUnavailable {
        service: String,
        upstream: String,
        reason: UnavailableReason,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The outbound request could not be assembled.
    #[error("cannot build upstream request: {0}")]
    Request(#[from] axum::http::Error),
}
