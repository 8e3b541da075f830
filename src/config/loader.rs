//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;

use crate::config::schema::RouterConfig;
use crate::error::ConfigurationError;

/// Environment variable overriding `upstream.base_host`.
pub const HOST_VAR: &str = "HOST";
/// Environment variable overriding `upstream.base_port`.
pub const PORT_VAR: &str = "PORT";

/// Load configuration from an optional TOML file, then apply `HOST`/`PORT`
/// from the process environment.
///
/// The environment is read exactly once, here. Semantic checks happen when
/// the route table is built.
pub fn load_config(path: Option<&Path>) -> Result<RouterConfig, ConfigurationError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            let config = parse_config(&content)?;
            tracing::debug!(path = %path.display(), "Config file parsed");
            config
        }
        None => RouterConfig::default(),
    };

    apply_env_overrides(&mut config, |var| std::env::var(var).ok())?;
    Ok(config)
}

/// Parse a TOML document into a configuration.
pub fn parse_config(content: &str) -> Result<RouterConfig, ConfigurationError> {
    Ok(toml::from_str(content)?)
}

/// Apply `HOST`/`PORT` overrides using `lookup` to read variables.
pub fn apply_env_overrides<F>(config: &mut RouterConfig, lookup: F) -> Result<(), ConfigurationError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = lookup(HOST_VAR).filter(|h| !h.trim().is_empty()) {
        config.upstream.base_host = host.trim().to_string();
    }

    if let Some(port) = lookup(PORT_VAR).filter(|p| !p.trim().is_empty()) {
        config.upstream.base_port = port.trim().parse().map_err(|_| ConfigurationError::Env {
            var: PORT_VAR,
            value: port.clone(),
        })?;
    }

    Ok(())
}
