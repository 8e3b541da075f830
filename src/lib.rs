//! Development request router for the dashboard's API services.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod routing;
pub mod security;

pub use config::schema::RouterConfig;
pub use error::{ConfigurationError, ProxyError};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::{build_route_table, Binding, RouteTable};
