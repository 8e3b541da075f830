//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the router.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Prefixes served when no `[[services]]` are configured, in offset order.
pub const DEFAULT_PREFIXES: [&str; 6] = [
    "/api/climate_impact",
    "/api/wind_assessment",
    "/api/noise_assessment",
    "/api/optimized_trajectories",
    "/api/emissions",
    "/api/atmospheric_pollution",
];

/// Root configuration for the router.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Listener configuration.
    pub listener: ListenerConfig,

    /// Shared addressing defaults for services.
    pub upstream: UpstreamConfig,

    /// Service definitions, in declaration order.
    pub services: Vec<ServiceConfig>,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            upstream: UpstreamConfig::default(),
            services: DEFAULT_PREFIXES.iter().map(|p| ServiceConfig::new(*p)).collect(),
            timeouts: TimeoutConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl RouterConfig {
    /// Address the router listens on.
    ///
    /// Falls back to the base authority, which is where the dashboard's dev
    /// server itself lives.
    pub fn bind_address(&self) -> String {
        match &self.listener.bind_address {
            Some(addr) => addr.clone(),
            None => format_authority(&self.upstream.base_host, u32::from(self.upstream.base_port)),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:4000").
    pub bind_address: Option<String>,
}

/// Addressing defaults shared by all services.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Host every offset-addressed service lives on.
    pub base_host: String,

    /// Port that offsets are added to.
    pub base_port: u16,

    /// Rewrite the outbound Host header to the target authority.
    pub change_origin: bool,

    /// Add X-Forwarded-For, X-Forwarded-Host and X-Forwarded-Proto.
    pub forwarded_headers: bool,

    /// Resolve every target through DNS before accepting traffic.
    pub resolve_on_startup: bool,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_host: "localhost".to_string(),
            base_port: 4000,
            change_origin: true,
            forwarded_headers: false,
            resolve_on_startup: true,
        }
    }
}

/// A single routable backend service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Path prefix owned by this service.
    pub prefix: String,

    /// Name for logs and metrics. Defaults to the prefix's last segment.
    #[serde(default)]
    pub name: Option<String>,

    /// Literal "host:port" target. Mutually exclusive with `offset`.
    #[serde(default)]
    pub target: Option<String>,

    /// Offset added to `base_port`. Defaults to the 1-based position.
    #[serde(default)]
    pub offset: Option<u32>,

    /// Per-service override of `upstream.change_origin`.
    #[serde(default)]
    pub change_origin: Option<bool>,

    /// Remove the prefix before forwarding.
    #[serde(default = "default_strip_prefix")]
    pub strip_prefix: bool,
}

fn default_strip_prefix() -> bool {
    true
}

impl ServiceConfig {
    /// An offset-addressed service with all defaults.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            name: None,
            target: None,
            offset: None,
            change_origin: None,
            strip_prefix: true,
        }
    }

    /// A service pinned to a literal "host:port".
    pub fn with_target(prefix: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            target: Some(target.into()),
            ..Self::new(prefix)
        }
    }

    /// Display name, derived from the prefix when not configured.
    pub fn display_name(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        self.prefix
            .trim_end_matches('/')
            .rsplit('/')
            .find(|s| !s.is_empty())
            .unwrap_or("root")
            .to_string()
    }
}

/// Timeout configuration for backend calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Time allowed for the backend to send its response head, in seconds.
    pub response_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            response_secs: 60,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log line format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Join host and port, bracketing bare IPv6 literals.
pub fn format_authority(host: &str, port: u32) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}
