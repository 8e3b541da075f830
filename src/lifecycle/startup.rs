//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the route table from the captured configuration
//! - Check that every target resolves (optional)
//! - Hand a ready server back to the caller, which binds the listener
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listeners start last (traffic only when ready)

use crate::config::RouterConfig;
use crate::error::ConfigurationError;
use crate::http::HttpServer;
use crate::routing::{build_route_table, RouteTable};

/// Build everything needed to serve `config`.
pub async fn prepare(config: &RouterConfig) -> Result<HttpServer, ConfigurationError> {
    let table = build_route_table(config)?;

    for binding in table.bindings() {
        tracing::info!(
            service = binding.name(),
            prefix = binding.prefix(),
            upstream = %binding.target(),
            change_origin = binding.change_origin(),
            "Route registered"
        );
    }

    if config.upstream.resolve_on_startup {
        resolve_targets(&table).await?;
    }

    Ok(HttpServer::new(table, config))
}

/// Resolve every target authority through the system resolver.
pub async fn resolve_targets(table: &RouteTable) -> Result<(), ConfigurationError> {
    for binding in table.bindings() {
        let unresolvable = |reason: String| ConfigurationError::Unresolvable {
            prefix: binding.prefix().to_string(),
            authority: binding.target().to_string(),
            reason,
        };

        let mut addrs = tokio::net::lookup_host(binding.target().as_str())
            .await
            .map_err(|e| unresolvable(e.to_string()))?;

        match addrs.next() {
            Some(addr) => tracing::debug!(
                service = binding.name(),
                upstream = %binding.target(),
                resolved = %addr,
                "Target resolved"
            ),
            None => return Err(unresolvable("no addresses returned".to_string())),
        }
    }
    Ok(())
}
