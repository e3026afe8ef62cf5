//! Textual URL rewriting over XML response bodies.
//!
//! Two ordered substitutions, applied to the whole decoded body:
//!
//! 1. Absolute URLs (`https://host/path`) become
//!    `<origin><prefix>/host/path`, recovering references the upstream
//!    embedded (calendar-object hrefs, principal URLs).
//! 2. Root-relative paths inside `<href>` elements (optionally
//!    namespace-prefixed) are prefixed with `<origin><prefix>` so they
//!    route back through the tunnel.
//!
//! Both are regex substitutions over text, not an XML parse. URLs that
//! already point through the tunnel are left alone, so re-applying the
//! rewrite never double-prefixes.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::rewrite::origin::Origin;
use crate::rewrite::path_is_tunneled;

static ABSOLUTE_URL: LazyLock<Regex> = LazyLock::new(|| {
    // Host runs to the first '/', path to the closing '<' of the
    // enclosing element.
    Regex::new(r"(?i)https?://([^/]+)(/[^<]*)").expect("valid absolute-URL regex")
});

static HREF_ELEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(<(?:\w+:)?href(?:\s+[^>]*)?>)(/[^<]+)").expect("valid href regex")
});

/// Rewrite every embedded URL in `text` to route through the tunnel at
/// `prefix` on `origin`.
pub fn rewrite_xml_body(text: &str, origin: &Origin, prefix: &str) -> String {
    let base = origin.base_url();

    let absolute_pass = ABSOLUTE_URL.replace_all(text, |caps: &Captures| {
        let host = &caps[1];
        let path = &caps[2];
        if host.eq_ignore_ascii_case(&origin.host) && path_is_tunneled(path, prefix) {
            caps[0].to_string()
        } else {
            format!("{base}{prefix}/{host}{path}")
        }
    });

    HREF_ELEMENT
        .replace_all(&absolute_pass, |caps: &Captures| {
            let open_tag = &caps[1];
            let path = &caps[2];
            if path_is_tunneled(path, prefix) {
                caps[0].to_string()
            } else {
                format!("{open_tag}{base}{prefix}{path}")
            }
        })
        .into_owned()
}
