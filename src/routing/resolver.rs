//! Upstream host extraction from request paths.
//!
//! CalDAV responses embed absolute server URLs, which the rewriter folds
//! into the tunnel as `<prefix>/<host>/<path>`. When the client follows
//! such a link, the upstream host must be recovered from the first path
//! segment after the prefix. A segment counts as a host only if it
//! contains a literal `.`; anything else (calendar IDs, principal IDs) is
//! an ordinary path component served by the default host.

/// Where a single request goes: derived once, used by both the forwarder
/// (destination) and the rewriter (tunnel prefix reconstruction).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDecision {
    /// Host for the outbound leg.
    pub upstream_host: String,

    /// Path forwarded to the upstream, always starting with '/'.
    pub residual_path: String,
}

/// Derive the route for `path` under `prefix`, falling back to
/// `default_host` when no host is embedded in the path.
///
/// Pure function; a segment without a dot is a normal outcome, not an
/// error.
pub fn resolve_route(path: &str, prefix: &str, default_host: &str) -> RouteDecision {
    let rest = path.strip_prefix(prefix).unwrap_or(path);

    if let Some(stripped) = rest.strip_prefix('/') {
        let (segment, remainder) = match stripped.split_once('/') {
            Some((seg, rem)) => (seg, format!("/{rem}")),
            None => (stripped, String::new()),
        };

        if segment.contains('.') {
            return RouteDecision {
                upstream_host: segment.to_string(),
                residual_path: if remainder.is_empty() {
                    "/".to_string()
                } else {
                    remainder
                },
            };
        }
    }

    RouteDecision {
        upstream_host: default_host.to_string(),
        residual_path: if rest.is_empty() {
            "/".to_string()
        } else {
            rest.to_string()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dotted_segment_becomes_upstream_host() {
        let decision = resolve_route("/api/ical/caldav.icloud.com/principal", "/api/ical", "fallback.example");
        assert_eq!(decision.upstream_host, "caldav.icloud.com");
        assert_eq!(decision.residual_path, "/principal");
    }

    #[test]
    fn test_dotted_segment_with_empty_rest_maps_to_root() {
        let decision = resolve_route("/api/ical/caldav.icloud.com", "/api/ical", "fallback.example");
        assert_eq!(decision.upstream_host, "caldav.icloud.com");
        assert_eq!(decision.residual_path, "/");
    }

    #[test]
    fn test_undotted_segment_falls_back_to_default_host() {
        let decision = resolve_route("/api/ical/123/calendars", "/api/ical", "caldav.icloud.com");
        assert_eq!(decision.upstream_host, "caldav.icloud.com");
        assert_eq!(decision.residual_path, "/123/calendars");
    }

    #[test]
    fn test_bare_prefix_maps_to_root() {
        let decision = resolve_route("/api/ical", "/api/ical", "caldav.icloud.com");
        assert_eq!(decision.upstream_host, "caldav.icloud.com");
        assert_eq!(decision.residual_path, "/");
    }

    #[test]
    fn test_deep_host_path_keeps_remainder_intact() {
        let decision = resolve_route(
            "/api/ical/p01-caldav.icloud.com/123/calendars/home/cal.ics",
            "/api/ical",
            "caldav.icloud.com",
        );
        assert_eq!(decision.upstream_host, "p01-caldav.icloud.com");
        assert_eq!(decision.residual_path, "/123/calendars/home/cal.ics");
    }

    #[test]
    fn test_numeric_dotted_segment_is_misread_as_host() {
        // Known limitation of the dot heuristic, preserved deliberately.
        let decision = resolve_route("/api/ical/1.2/x", "/api/ical", "caldav.icloud.com");
        assert_eq!(decision.upstream_host, "1.2");
        assert_eq!(decision.residual_path, "/x");
    }
}
