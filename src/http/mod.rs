//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing)
//!     → routing (match + rewrite)
//!     → forward.rs (relay to backend, stream response)
//!     → response.rs (error → status code)
//!     → Send to client
//! ```

pub mod forward;
pub mod request;
pub mod response;
pub mod server;

pub use forward::Forwarder;
pub use request::{RequestIdExt, X_REQUEST_ID};
pub use server::HttpServer;
