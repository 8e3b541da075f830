//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path)
//!     → matcher.rs (segment-anchored prefix lookup)
//!     → Return: matched Binding or NoMatch
//!     → rewrite.rs (strip prefix, keep query)
//!
//! Route Compilation (at startup):
//!     RouterConfig.services
//!     → table.rs (validate, resolve targets)
//!     → Sort by prefix length
//!     → Freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always matches same route
//! - Longest prefix wins

pub mod matcher;
pub mod rewrite;
pub mod table;

pub use matcher::matches_prefix;
pub use rewrite::{rewrite, rewrite_path_and_query};
pub use table::{build_route_table, Binding, Rewrite, RouteTable};
