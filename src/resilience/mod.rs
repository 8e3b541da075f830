//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Forwarder
//!     → timeouts.rs (connect deadline, response-head deadline)
//!     → on expiry: BackendUnavailable (502)
//! ```
//!
//! # Design Decisions
//! - No retries: each prefix has exactly one authoritative backend
//! - Failures are reported, never re-routed

pub mod timeouts;
