//! Redirect target rewriting.
//!
//! Upstream redirects carry either full URLs or root-relative paths in
//! `Location`. Both forms are folded back into the tunnel so a client
//! following the redirect lands on the proxy again.

use std::sync::LazyLock;

use regex::Regex;

use crate::rewrite::origin::Origin;
use crate::rewrite::path_is_tunneled;

static ABSOLUTE_LOCATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^https?://([^/]+)(/.*)?$").expect("valid location regex")
});

/// Rewrite a `Location` header value. Values that are neither absolute
/// URLs nor root-relative paths pass through unchanged.
pub fn rewrite_location(value: &str, origin: &Origin, prefix: &str) -> String {
    let base = origin.base_url();

    if value.starts_with("http") {
        if let Some(caps) = ABSOLUTE_LOCATION.captures(value) {
            let host = &caps[1];
            let path = caps.get(2).map_or("", |m| m.as_str());
            if host.eq_ignore_ascii_case(&origin.host) && path_is_tunneled(path, prefix) {
                return value.to_string();
            }
            return format!("{base}{prefix}/{host}{path}");
        }
        return value.to_string();
    }

    if value.starts_with('/') && !path_is_tunneled(value, prefix) {
        return format!("{base}{prefix}{value}");
    }

    value.to_string()
}
