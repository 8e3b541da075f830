//! Route matching logic.
//!
//! # Responsibilities
//! - Match the request path against binding prefixes
//! - Respect path segment boundaries
//! - Pick the longest matching prefix
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - Only the path participates; the query string never does
//! - No regex to guarantee O(n) matching

use crate::routing::table::{Binding, RouteTable};

/// Whether `prefix` owns `path`.
///
/// The character after the prefix must be `/` or the end of the path, so
/// `/api/wind` owns `/api/wind/x` but not `/api/windfoo`. A prefix ending in
/// `/` (only `/` itself passes validation) owns everything below it.
pub fn matches_prefix(prefix: &str, path: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/') || prefix.ends_with('/'),
        None => false,
    }
}

impl RouteTable {
    /// Find the binding that owns `path`, longest prefix first.
    ///
    /// `None` is a routing miss: the caller answers 404 without contacting
    /// any backend.
    pub fn match_path(&self, path: &str) -> Option<&Binding> {
        self.lookup_order
            .iter()
            .map(|&index| self.binding_at(index))
            .find(|binding| matches_prefix(binding.prefix(), path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{RouterConfig, ServiceConfig, DEFAULT_PREFIXES};
    use crate::routing::table::build_route_table;

    fn table(prefixes: &[&str]) -> RouteTable {
        let mut config = RouterConfig::default();
        config.services = prefixes.iter().map(|p| ServiceConfig::new(*p)).collect();
        build_route_table(&config).unwrap()
    }

    #[test]
    fn test_segment_boundary() {
        assert!(matches_prefix("/api/wind", "/api/wind"));
        assert!(matches_prefix("/api/wind", "/api/wind/"));
        assert!(matches_prefix("/api/wind", "/api/wind/report"));
        assert!(!matches_prefix("/api/wind", "/api/windfoo"));
        assert!(!matches_prefix("/api/wind", "/api"));
        assert!(!matches_prefix("/api/wind", "/API/wind"));
        assert!(matches_prefix("/", "/anything"));
    }

    #[test]
    fn test_every_default_prefix_matches_itself() {
        let table = table(&DEFAULT_PREFIXES);
        for prefix in DEFAULT_PREFIXES {
            for path in [prefix.to_string(), format!("{prefix}/"), format!("{prefix}/a/b")] {
                assert_eq!(table.match_path(&path).map(Binding::prefix), Some(prefix), "{path}");
            }
        }
    }

    #[test]
    fn test_extended_segment_does_not_match() {
        let table = table(&DEFAULT_PREFIXES);
        assert!(table.match_path("/api/wind_assessment_extra").is_none());
        assert!(table.match_path("/api/wind_assessment_extra/x").is_none());
    }

    #[test]
    fn test_unknown_prefix() {
        let table = table(&DEFAULT_PREFIXES);
        assert!(table.match_path("/api/unknown").is_none());
        assert!(table.match_path("/").is_none());
        assert!(table.match_path("").is_none());
    }

    #[test]
    fn test_longest_prefix_wins() {
        let table = table(&["/api", "/api/emissions", "/api/emissions/v2"]);
        let hit = |p: &str| table.match_path(p).map(Binding::prefix);

        assert_eq!(hit("/api/emissions/v2/summary"), Some("/api/emissions/v2"));
        assert_eq!(hit("/api/emissions/v1/summary"), Some("/api/emissions"));
        assert_eq!(hit("/api/emissions_x"), Some("/api"));
        assert_eq!(hit("/apix"), None);
    }
}
