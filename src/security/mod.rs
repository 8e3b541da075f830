//! Header hygiene for proxied requests and responses.
//!
//! # Data Flow
//! ```text
//! Inbound request headers
//!     → headers.rs (strip hop-by-hop, Host policy, X-Forwarded-*)
//!     → Forwarder
//!
//! Backend response headers
//!     → headers.rs (strip hop-by-hop)
//!     → Client
//! ```

pub mod headers;
