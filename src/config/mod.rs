//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse, apply HOST/PORT from the environment)
//!     → CLI overrides (main.rs)
//!     → validation.rs (semantic checks, target resolution)
//!     → RouteTable (routing::table, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is captured once at startup; nothing reads the environment later
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::load_config;
pub use schema::{
    ListenerConfig, LogFormat, ObservabilityConfig, RouterConfig, ServiceConfig, TimeoutConfig,
    UpstreamConfig, DEFAULT_PREFIXES,
};
