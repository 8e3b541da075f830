//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Resolve each service to a concrete target authority
//! - Validate value ranges (timeouts > 0, ports in 1..=65535)
//! - Detect conflicting prefixes
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Pure functions: no DNS, no sockets, no clock
//! - Runs before any listener is bound

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::str::FromStr;

use axum::http::uri::Authority;
use thiserror::Error;

use crate::config::schema::{format_authority, RouterConfig, ServiceConfig, UpstreamConfig};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no services configured")]
    NoServices,

    #[error("prefix {prefix:?} {reason}")]
    InvalidPrefix { prefix: String, reason: &'static str },

    #[error("prefix {0:?} is declared more than once")]
    DuplicatePrefix(String),

    #[error("base host {0:?} is not a valid host name or IP address")]
    InvalidBaseHost(String),

    #[error("target {target:?} for {prefix:?} {reason}")]
    InvalidTarget {
        prefix: String,
        target: String,
        reason: &'static str,
    },

    #[error("port {port} for {prefix:?} is outside 1..=65535")]
    PortOutOfRange { prefix: String, port: u32 },

    #[error("{prefix:?} sets both `target` and `offset`")]
    AmbiguousTarget { prefix: String },

    #[error("timeouts.{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("metrics address {0:?} is not a socket address")]
    InvalidMetricsAddress(String),
}

/// Check the parts of the configuration that are not per-service.
pub fn validate_settings(config: &RouterConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if config.services.is_empty() {
        errors.push(ValidationError::NoServices);
    }
    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("connect_secs"));
    }
    if config.timeouts.response_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("response_secs"));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }
    if config.services.iter().any(|s| s.target.is_none()) && !is_valid_host(&config.upstream.base_host) {
        errors.push(ValidationError::InvalidBaseHost(config.upstream.base_host.clone()));
    }

    errors
}

/// Check a route prefix. Returns the reason it is rejected.
pub fn check_prefix(prefix: &str) -> Result<(), &'static str> {
    if prefix.is_empty() {
        return Err("must not be empty");
    }
    if !prefix.starts_with('/') {
        return Err("must start with '/'");
    }
    if prefix.len() > 1 && prefix.ends_with('/') {
        return Err("must not end with '/'");
    }
    if prefix.contains("//") {
        return Err("must not contain empty segments");
    }
    if prefix.chars().any(|c| c == '?' || c == '#' || c.is_whitespace()) {
        return Err("must not contain a query, fragment or whitespace");
    }
    Ok(())
}

/// Resolve the target authority of the service at 0-based `index`.
///
/// Literal targets win; otherwise `base_host:(base_port + offset)` where the
/// offset defaults to `index + 1`. The base host is checked once by
/// [`validate_settings`].
pub fn resolve_target(
    service: &ServiceConfig,
    index: usize,
    upstream: &UpstreamConfig,
) -> Result<Authority, ValidationError> {
    match (&service.target, service.offset) {
        (Some(_), Some(_)) => Err(ValidationError::AmbiguousTarget {
            prefix: service.prefix.clone(),
        }),
        (Some(target), None) => parse_literal_target(&service.prefix, target),
        (None, offset) => {
            let offset = offset.unwrap_or(index as u32 + 1);
            let port = u32::from(upstream.base_port).saturating_add(offset);
            check_port(&service.prefix, port)?;
            Authority::from_str(&format_authority(&upstream.base_host, port))
                .map_err(|_| ValidationError::InvalidBaseHost(upstream.base_host.clone()))
        }
    }
}

fn parse_literal_target(prefix: &str, target: &str) -> Result<Authority, ValidationError> {
    let invalid = |reason| ValidationError::InvalidTarget {
        prefix: prefix.to_string(),
        target: target.to_string(),
        reason,
    };

    if target.starts_with("https://") {
        return Err(invalid("uses https, which is not supported"));
    }
    let authority = target.strip_prefix("http://").unwrap_or(target);
    let authority = authority.strip_suffix('/').unwrap_or(authority);

    let (host, port) = authority
        .rsplit_once(':')
        .ok_or_else(|| invalid("must be host:port"))?;
    let port: u32 = port.parse().map_err(|_| invalid("has a non-numeric port"))?;
    check_port(prefix, port)?;

    if !is_valid_host(host) {
        return Err(invalid("has an invalid host"));
    }
    Authority::from_str(&format_authority(host, port)).map_err(|_| invalid("has an invalid host"))
}

fn check_port(prefix: &str, port: u32) -> Result<(), ValidationError> {
    if port == 0 || port > u32::from(u16::MAX) {
        return Err(ValidationError::PortOutOfRange {
            prefix: prefix.to_string(),
            port,
        });
    }
    Ok(())
}

/// Accepts IPv4, IPv6 (bare or bracketed) and RFC 1123 host names.
pub fn is_valid_host(host: &str) -> bool {
    if host.parse::<Ipv4Addr>().is_ok() {
        return true;
    }
    let unbracketed = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    if unbracketed.parse::<Ipv6Addr>().is_ok() {
        return true;
    }
    if host.is_empty() || host.len() > 253 {
        return false;
    }
    host.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            // underscores show up in compose service names
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_rules() {
        assert!(check_prefix("/api/emissions").is_ok());
        assert!(check_prefix("/").is_ok());
        assert_eq!(check_prefix(""), Err("must not be empty"));
        assert_eq!(check_prefix("api/emissions"), Err("must start with '/'"));
        assert_eq!(check_prefix("/api/emissions/"), Err("must not end with '/'"));
        assert!(check_prefix("/api//emissions").is_err());
        assert!(check_prefix("/api/emissions?x=1").is_err());
        assert!(check_prefix("/api/emis sions").is_err());
    }

    #[test]
    fn hosts() {
        assert!(is_valid_host("localhost"));
        assert!(is_valid_host("0.0.0.0"));
        assert!(is_valid_host("climate_impact"));
        assert!(is_valid_host("api.example.com"));
        assert!(is_valid_host("::1"));
        assert!(is_valid_host("[::1]"));
        assert!(!is_valid_host(""));
        assert!(!is_valid_host("bad host"));
        assert!(!is_valid_host("-leading.example"));
        assert!(!is_valid_host("a..b"));
        assert!(!is_valid_host("host/path"));
    }

    #[test]
    fn offset_defaults_to_position() {
        let upstream = UpstreamConfig {
            base_host: "h".into(),
            ..UpstreamConfig::default()
        };
        let service = ServiceConfig::new("/api/noise_assessment");
        assert_eq!(resolve_target(&service, 2, &upstream).unwrap().as_str(), "h:4003");

        let mut explicit = ServiceConfig::new("/api/noise_assessment");
        explicit.offset = Some(10);
        assert_eq!(resolve_target(&explicit, 2, &upstream).unwrap().as_str(), "h:4010");
    }

    #[test]
    fn offset_overflow_is_rejected() {
        let upstream = UpstreamConfig {
            base_port: 65_535,
            ..UpstreamConfig::default()
        };
        let err = resolve_target(&ServiceConfig::new("/api/a"), 0, &upstream).unwrap_err();
        assert_eq!(
            err,
            ValidationError::PortOutOfRange {
                prefix: "/api/a".into(),
                port: 65_536
            }
        );
    }

    #[test]
    fn literal_targets() {
        let upstream = UpstreamConfig::default();
        let ok = |t: &str| resolve_target(&ServiceConfig::with_target("/a", t), 0, &upstream);

        assert_eq!(ok("127.0.0.1:5001").unwrap().as_str(), "127.0.0.1:5001");
        assert_eq!(ok("http://localhost:5001").unwrap().as_str(), "localhost:5001");
        assert_eq!(ok("http://localhost:5001/").unwrap().as_str(), "localhost:5001");
        assert_eq!(ok("[::1]:5001").unwrap().as_str(), "[::1]:5001");

        assert!(matches!(ok("localhost"), Err(ValidationError::InvalidTarget { .. })));
        assert!(matches!(ok("localhost:http"), Err(ValidationError::InvalidTarget { .. })));
        assert!(matches!(ok("https://localhost:5001"), Err(ValidationError::InvalidTarget { .. })));
        assert!(matches!(ok("bad host:5001"), Err(ValidationError::InvalidTarget { .. })));
        assert!(matches!(ok("localhost:0"), Err(ValidationError::PortOutOfRange { port: 0, .. })));
        assert!(matches!(ok("localhost:99999"), Err(ValidationError::PortOutOfRange { port: 99_999, .. })));
    }

    #[test]
    fn target_and_offset_conflict() {
        let mut service = ServiceConfig::with_target("/a", "localhost:5001");
        service.offset = Some(1);
        assert_eq!(
            resolve_target(&service, 0, &UpstreamConfig::default()),
            Err(ValidationError::AmbiguousTarget { prefix: "/a".into() })
        );
    }

    #[test]
    fn settings_report_every_problem() {
        let mut config = RouterConfig::default();
        config.timeouts.connect_secs = 0;
        config.timeouts.response_secs = 0;
        config.upstream.base_host = "not a host".into();
        config.observability.metrics_enabled = true;
        config.observability.metrics_address = "nowhere".into();

        let errors = validate_settings(&config);
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::ZeroTimeout("connect_secs")));
        assert!(errors.contains(&ValidationError::InvalidBaseHost("not a host".into())));
    }

    #[test]
    fn empty_service_list() {
        let config = RouterConfig {
            services: Vec::new(),
            ..RouterConfig::default()
        };
        assert_eq!(validate_settings(&config), vec![ValidationError::NoServices]);
    }
}
