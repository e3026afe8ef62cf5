//! Response rewriting subsystem.
//!
//! # Data Flow
//! ```text
//! Buffered upstream response (status, headers, body)
//!     → origin.rs (which scheme+host does the client see us as?)
//!     → body.rs (fold absolute URLs and hrefs back into the tunnel)
//!     → location.rs (keep redirects inside the tunnel)
//!     → header fixups (Content-Length, Content-Encoding)
//! ```
//!
//! # Design Decisions
//! - Best-effort text substitution, not an XML parse: calendar servers
//!   emit href values as simple text content, and a strict parse would
//!   reject tolerable malformed XML
//! - Any rewrite failure (e.g. non-UTF-8 body) falls back to the
//!   original bytes and headers; the request is never failed here
//! - Status codes are never changed

pub mod body;
pub mod location;
pub mod origin;

pub use body::rewrite_xml_body;
pub use location::rewrite_location;
pub use origin::Origin;

use axum::body::Bytes;
use axum::http::{header, HeaderMap, HeaderValue};

/// True if `path` already routes through the tunnel at `prefix`,
/// on a path-segment boundary.
pub(crate) fn path_is_tunneled(path: &str, prefix: &str) -> bool {
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Rewrite a buffered upstream response in place.
///
/// Bodies are touched only when the content type mentions XML
/// (substring match, case-insensitive; upstreams use vendor-specific XML
/// media types). A `Location` header is rewritten regardless of body
/// type so client-followed redirects stay inside the tunnel.
pub fn rewrite_response(headers: &mut HeaderMap, body: &mut Bytes, origin: &Origin, prefix: &str) {
    if let Some(location) = headers
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
    {
        let rewritten = rewrite_location(&location, origin, prefix);
        if rewritten != location {
            if let Ok(value) = HeaderValue::from_str(&rewritten) {
                headers.insert(header::LOCATION, value);
            }
        }
    }

    let is_xml = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.to_ascii_lowercase().contains("xml"));
    if !is_xml {
        return;
    }

    // Non-UTF-8 despite an XML content type: forward untouched rather
    // than corrupt the payload.
    let Ok(text) = std::str::from_utf8(body) else {
        return;
    };

    let rewritten = Bytes::from(rewrite_xml_body(text, origin, prefix));
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(rewritten.len()));
    headers.remove(header::CONTENT_ENCODING);
    *body = rewritten;
}
