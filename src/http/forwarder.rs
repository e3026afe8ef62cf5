//! Outbound leg: forward one inbound request to its resolved upstream.
//!
//! # Responsibilities
//! - Build the upstream URL from the route decision
//! - Carry method, headers, and body through unchanged
//! - Force `Accept-Encoding: identity` (the rewriter works on plain text)
//! - Buffer the complete upstream response before anything is emitted
//!
//! # Design Decisions
//! - Hop-by-hop headers never cross the proxy in either direction
//! - `Host` is dropped; the client derives it from the upstream URL
//! - Connectivity failures surface as typed gateway errors, never retried

use axum::body::Bytes;
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use thiserror::Error;

use crate::routing::RouteDecision;

/// Headers that describe a single connection, not the request; they are
/// stripped on both legs.
const HOP_BY_HOP: [header::HeaderName; 8] = [
    header::CONNECTION,
    header::HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// A fully buffered upstream response, ready for rewriting.
#[derive(Debug)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Failure on the outbound leg.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("invalid upstream url {0:?}")]
    InvalidUrl(String),

    #[error("upstream timed out: {0}")]
    Timeout(#[source] reqwest::Error),

    #[error("upstream request failed: {0}")]
    Connect(#[source] reqwest::Error),
}

impl ForwardError {
    /// Gateway status reported to the client.
    pub fn status(&self) -> StatusCode {
        match self {
            ForwardError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ForwardError::InvalidUrl(_) | ForwardError::Connect(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

fn classify(err: reqwest::Error) -> ForwardError {
    if err.is_timeout() {
        ForwardError::Timeout(err)
    } else {
        ForwardError::Connect(err)
    }
}

/// Copy inbound headers for the outbound leg: hop-by-hop and `Host`
/// dropped, `Accept-Encoding` forced to identity, everything else
/// (including credentials) unchanged.
fn outbound_headers(inbound: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(inbound.len());
    for (name, value) in inbound {
        if HOP_BY_HOP.contains(name)
            || name == header::HOST
            || name == header::ACCEPT_ENCODING
            || name == header::CONTENT_LENGTH
        {
            continue;
        }
        headers.insert(name.clone(), value.clone());
    }
    headers.insert(header::ACCEPT_ENCODING, HeaderValue::from_static("identity"));
    headers
}

/// Issue the outbound request and buffer the complete response.
///
/// The whole body is materialized before returning: URL occurrences are
/// not framed and may span chunk boundaries, so rewriting cannot stream.
pub async fn forward(
    client: &reqwest::Client,
    decision: &RouteDecision,
    scheme: &str,
    method: Method,
    inbound_headers: &HeaderMap,
    body: Bytes,
    query: Option<&str>,
) -> Result<UpstreamResponse, ForwardError> {
    let mut url = format!(
        "{}://{}{}",
        scheme, decision.upstream_host, decision.residual_path
    );
    if let Some(query) = query {
        url.push('?');
        url.push_str(query);
    }
    let url = reqwest::Url::parse(&url).map_err(|_| ForwardError::InvalidUrl(url))?;

    let response = client
        .request(method, url)
        .headers(outbound_headers(inbound_headers))
        .body(body)
        .send()
        .await
        .map_err(classify)?;

    let status = response.status();
    let mut headers = response.headers().clone();
    let body = response.bytes().await.map_err(classify)?;

    for name in HOP_BY_HOP {
        headers.remove(name);
    }

    Ok(UpstreamResponse {
        status,
        headers,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outbound_headers_force_identity_encoding() {
        let mut inbound = HeaderMap::new();
        inbound.insert(header::ACCEPT_ENCODING, HeaderValue::from_static("gzip, br"));
        inbound.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic Zm9vOmJhcg=="));
        inbound.insert(header::HOST, HeaderValue::from_static("myapp.example"));
        inbound.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        inbound.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        inbound.insert(
            header::PROXY_AUTHORIZATION,
            HeaderValue::from_static("Basic cHJveHk="),
        );

        let out = outbound_headers(&inbound);
        assert_eq!(out.get(header::ACCEPT_ENCODING).unwrap(), "identity");
        assert_eq!(out.get(header::AUTHORIZATION).unwrap(), "Basic Zm9vOmJhcg==");
        assert!(out.get(header::HOST).is_none());
        assert!(out.get(header::CONNECTION).is_none());
        assert!(out.get("keep-alive").is_none());
        assert!(out.get(header::PROXY_AUTHORIZATION).is_none());
    }

    #[test]
    fn test_gateway_status_mapping() {
        assert_eq!(
            ForwardError::InvalidUrl("nope".into()).status(),
            StatusCode::BAD_GATEWAY
        );
    }
}
