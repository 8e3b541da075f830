//! Route table construction.
//!
//! # Responsibilities
//! - Turn validated service configuration into bindings
//! - Reject duplicate prefixes and malformed targets
//! - Keep a longest-prefix-first lookup order for the matcher
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Built once from an owned config value, no I/O
//! - Every configuration problem reported in one error

use std::collections::HashSet;

use axum::http::uri::Authority;
use serde::{Serialize, Serializer};

use crate::config::schema::RouterConfig;
use crate::config::validation::{check_prefix, resolve_target, validate_settings, ValidationError};
use crate::error::ConfigurationError;

/// How a binding transforms the path before forwarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rewrite {
    /// Remove the leading prefix.
    StripPrefix,
    /// Forward the path as received.
    Preserve,
}

/// A single prefix-to-backend routing rule.
#[derive(Debug, Clone, Serialize)]
pub struct Binding {
    name: String,
    prefix: String,
    #[serde(serialize_with = "serialize_authority")]
    target: Authority,
    change_origin: bool,
    rewrite: Rewrite,
}

impl Binding {
    /// Service name for logs and metrics.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Destination authority (`host:port`).
    pub fn target(&self) -> &Authority {
        &self.target
    }

    /// Whether the outbound Host header becomes the target authority.
    pub fn change_origin(&self) -> bool {
        self.change_origin
    }

    pub fn rewrite_rule(&self) -> Rewrite {
        self.rewrite
    }
}

fn serialize_authority<S: Serializer>(authority: &Authority, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(authority.as_str())
}

/// Immutable, ordered collection of bindings.
#[derive(Debug, Clone)]
pub struct RouteTable {
    /// Declaration order.
    bindings: Vec<Binding>,
    /// Indexes into `bindings`, longest prefix first.
    pub(crate) lookup_order: Vec<usize>,
}

impl RouteTable {
    /// Bindings in declaration order.
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub(crate) fn binding_at(&self, index: usize) -> &Binding {
        &self.bindings[index]
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Binding declared with exactly this prefix.
    pub fn get(&self, prefix: &str) -> Option<&Binding> {
        self.bindings.iter().find(|b| b.prefix == prefix)
    }
}

/// Build the route table from configuration.
pub fn build_route_table(config: &RouterConfig) -> Result<RouteTable, ConfigurationError> {
    let mut errors = validate_settings(config);
    let mut seen = HashSet::new();
    let mut bindings = Vec::with_capacity(config.services.len());

    for (index, service) in config.services.iter().enumerate() {
        if let Err(reason) = check_prefix(&service.prefix) {
            errors.push(ValidationError::InvalidPrefix {
                prefix: service.prefix.clone(),
                reason,
            });
            continue;
        }

        if !seen.insert(service.prefix.as_str()) {
            push_unique(&mut errors, ValidationError::DuplicatePrefix(service.prefix.clone()));
            continue;
        }

        match resolve_target(service, index, &config.upstream) {
            Ok(target) => bindings.push(Binding {
                name: service.display_name(),
                prefix: service.prefix.clone(),
                target,
                change_origin: service.change_origin.unwrap_or(config.upstream.change_origin),
                rewrite: if service.strip_prefix {
                    Rewrite::StripPrefix
                } else {
                    Rewrite::Preserve
                },
            }),
            Err(e) => push_unique(&mut errors, e),
        }
    }

    if !errors.is_empty() {
        return Err(ConfigurationError::Invalid(errors));
    }

    let mut lookup_order: Vec<usize> = (0..bindings.len()).collect();
    // stable sort keeps declaration order among equal lengths
    lookup_order.sort_by(|&a, &b| bindings[b].prefix.len().cmp(&bindings[a].prefix.len()));

    Ok(RouteTable {
        bindings,
        lookup_order,
    })
}

fn push_unique(errors: &mut Vec<ValidationError>, error: ValidationError) {
    if !errors.contains(&error) {
        errors.push(error);
    }
}
