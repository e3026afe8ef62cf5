//! Origin reconstruction from the inbound request.

use axum::http::{header, HeaderMap, Uri};

/// Scheme and host the client used to reach the proxy. Rewritten
/// absolute URLs are built against this so they route back through us.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    pub scheme: String,
    pub host: String,
}

impl Origin {
    /// Derive the origin from forwarded-proto/host headers. A proxy or
    /// load balancer in front of us sets `X-Forwarded-Proto`; absent
    /// that, the inbound leg is plain HTTP.
    pub fn from_request(headers: &HeaderMap, uri: &Uri) -> Self {
        let scheme = headers
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("http")
            .to_string();
        let host = headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .or_else(|| uri.authority().map(|a| a.to_string()))
            .unwrap_or_else(|| "localhost".to_string());
        Self { scheme, host }
    }

    /// `scheme://host`, the base for every rewritten URL.
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.scheme, self.host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_forwarded_proto_and_host() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-proto", HeaderValue::from_static("https"));
        headers.insert(header::HOST, HeaderValue::from_static("myapp.example"));

        let origin = Origin::from_request(&headers, &Uri::from_static("/api/ical/x"));
        assert_eq!(origin.base_url(), "https://myapp.example");
    }

    #[test]
    fn test_defaults_to_http() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("localhost:8080"));

        let origin = Origin::from_request(&headers, &Uri::from_static("/api/ical/x"));
        assert_eq!(origin.base_url(), "http://localhost:8080");
    }
}
