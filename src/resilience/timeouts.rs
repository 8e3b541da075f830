//! Timeout enforcement for backend calls.
//!
//! # Responsibilities
//! - Configure the connect timeout on the HTTP connector
//! - Bound the wait for a backend's response head
//! - Cancel operations cleanly on timeout
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from other errors
//! - Timed-out requests surface as backend unavailable (502)
//! - The response body is streamed and not covered by the deadline

use std::future::Future;
use std::time::Duration;

use hyper_util::client::legacy::connect::HttpConnector;

use crate::config::TimeoutConfig;

/// The backend did not answer within the deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedOut(pub Duration);

impl std::fmt::Display for TimedOut {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "no response within {:?}", self.0)
    }
}

impl std::error::Error for TimedOut {}

/// Deadlines applied to every backend call.
#[derive(Debug, Clone, Copy)]
pub struct UpstreamTimeouts {
    pub connect: Duration,
    pub response: Duration,
}

impl From<&TimeoutConfig> for UpstreamTimeouts {
    fn from(config: &TimeoutConfig) -> Self {
        Self {
            connect: Duration::from_secs(config.connect_secs),
            response: Duration::from_secs(config.response_secs),
        }
    }
}

impl UpstreamTimeouts {
    /// An HTTP connector honouring the connect deadline.
    pub fn connector(&self) -> HttpConnector {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(self.connect));
        connector.set_nodelay(true);
        connector
    }

    /// Await `fut`, giving up after the response deadline.
    ///
    /// Dropping the inner future on timeout aborts the backend request.
    pub async fn response<F, T>(&self, fut: F) -> Result<T, TimedOut>
    where
        F: Future<Output = T>,
    {
        tokio::time::timeout(self.response, fut)
            .await
            .map_err(|_| TimedOut(self.response))
    }
}
