//! Tunnel lookup and dispatch.
//!
//! # Responsibilities
//! - Store compiled tunnels
//! - Look up the tunnel owning a request path
//! - Return matched tunnel or explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) prefix scan, longest prefix first (tunnel counts are tiny)
//! - Prefixes match on path-segment boundaries only

use crate::config::schema::TunnelConfig;

/// A mounted tunnel, compiled from configuration at startup.
#[derive(Debug, Clone)]
pub struct Tunnel {
    /// Path prefix this tunnel intercepts, without a trailing slash.
    pub prefix: String,

    /// Upstream host used when the path does not embed one.
    pub default_host: String,

    /// Scheme for the outbound leg.
    pub upstream_scheme: String,
}

/// Immutable set of mounted tunnels.
#[derive(Debug)]
pub struct TunnelTable {
    tunnels: Vec<Tunnel>,
}

impl TunnelTable {
    /// Compile the tunnel table, longest prefix first so overlapping
    /// prefixes resolve deterministically.
    pub fn from_config(configs: Vec<TunnelConfig>) -> Self {
        let mut tunnels: Vec<Tunnel> = configs
            .into_iter()
            .map(|c| Tunnel {
                prefix: c.prefix.trim_end_matches('/').to_string(),
                default_host: c.default_host,
                upstream_scheme: c.upstream_scheme,
            })
            .collect();
        tunnels.sort_by(|a, b| b.prefix.len().cmp(&a.prefix.len()));
        Self { tunnels }
    }

    /// Find the tunnel owning `path`, if any.
    pub fn match_path(&self, path: &str) -> Option<&Tunnel> {
        self.tunnels.iter().find(|t| {
            path == t.prefix
                || path
                    .strip_prefix(t.prefix.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(prefixes: &[&str]) -> TunnelTable {
        TunnelTable::from_config(
            prefixes
                .iter()
                .map(|p| TunnelConfig {
                    prefix: p.to_string(),
                    default_host: "caldav.icloud.com".to_string(),
                    upstream_scheme: "https".to_string(),
                })
                .collect(),
        )
    }

    #[test]
    fn test_matches_exact_prefix_and_subpaths() {
        let t = table(&["/api/ical"]);
        assert!(t.match_path("/api/ical").is_some());
        assert!(t.match_path("/api/ical/123/calendars").is_some());
        assert!(t.match_path("/other").is_none());
    }

    #[test]
    fn test_prefix_requires_segment_boundary() {
        let t = table(&["/api/ical"]);
        assert!(t.match_path("/api/icalendar").is_none());
    }

    #[test]
    fn test_longest_prefix_wins() {
        let t = table(&["/api", "/api/ical"]);
        let m = t.match_path("/api/ical/x").unwrap();
        assert_eq!(m.prefix, "/api/ical");
        let m = t.match_path("/api/other").unwrap();
        assert_eq!(m.prefix, "/api");
    }

    #[test]
    fn test_two_independent_mounts() {
        let t = table(&["/api/ical", "/.well-known/caldav"]);
        assert_eq!(t.match_path("/.well-known/caldav").unwrap().prefix, "/.well-known/caldav");
        assert_eq!(t.match_path("/api/ical/x").unwrap().prefix, "/api/ical");
    }
}
