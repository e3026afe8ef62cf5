//! HTTP server setup and tunnel dispatch.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all tunnel handler
//! - Wire up middleware (tracing, timeout, request ID)
//! - Dispatch requests: match tunnel → resolve route → forward → rewrite
//! - Map outbound failures to gateway status codes

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::http::forwarder;
use crate::http::request::{MakeRequestUuid, X_REQUEST_ID};
use crate::observability::metrics;
use crate::rewrite::{self, Origin};
use crate::routing::{resolve_route, TunnelTable};

/// Application state injected into the handler.
#[derive(Clone)]
pub struct AppState {
    pub tunnels: Arc<TunnelTable>,
    pub client: reqwest::Client,
    pub max_body_bytes: usize,
}

/// HTTP server for the tunneling proxy.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Self {
        let tunnels = Arc::new(TunnelTable::from_config(config.tunnels.clone()));

        // One pooled client for all outbound legs; redirects must pass
        // through untouched so Location rewriting can see them.
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .timeout(Duration::from_secs(config.timeouts.upstream_secs))
            .pool_idle_timeout(Duration::from_secs(config.timeouts.idle_secs))
            .build()
            .expect("failed to build upstream HTTP client");

        let state = AppState {
            tunnels,
            client,
            max_body_bytes: config.limits.max_body_bytes,
        };

        let router = Self::build_router(&config, state);
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Main tunnel handler.
/// Matches the tunnel, resolves the upstream, forwards, and rewrites.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let method = request.method().clone();
    let method_str = method.to_string();
    let path = request.uri().path().to_string();
    let query = request.uri().query().map(str::to_string);

    let Some(tunnel) = state.tunnels.match_path(&path) else {
        tracing::warn!(request_id = %request_id, path = %path, "No tunnel mounted for path");
        metrics::record_request(&method_str, 404, "none", start_time);
        return (StatusCode::NOT_FOUND, "No tunnel mounted for this path").into_response();
    };

    // Derived once; forwarder and rewriter both work from this decision.
    let decision = resolve_route(&path, &tunnel.prefix, &tunnel.default_host);
    let origin = Origin::from_request(request.headers(), request.uri());

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        upstream = %decision.upstream_host,
        residual = %decision.residual_path,
        "Proxying request"
    );

    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(_) => {
            metrics::record_request(&method_str, 413, &decision.upstream_host, start_time);
            return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
        }
    };

    match forwarder::forward(
        &state.client,
        &decision,
        &tunnel.upstream_scheme,
        method,
        &parts.headers,
        body,
        query.as_deref(),
    )
    .await
    {
        Ok(mut upstream) => {
            rewrite::rewrite_response(
                &mut upstream.headers,
                &mut upstream.body,
                &origin,
                &tunnel.prefix,
            );

            metrics::record_request(
                &method_str,
                upstream.status.as_u16(),
                &decision.upstream_host,
                start_time,
            );

            let mut response = Response::new(Body::from(upstream.body));
            *response.status_mut() = upstream.status;
            *response.headers_mut() = upstream.headers;
            response
        }
        Err(e) => {
            tracing::error!(
                request_id = %request_id,
                upstream = %decision.upstream_host,
                error = %e,
                "Upstream error"
            );
            metrics::record_request(
                &method_str,
                e.status().as_u16(),
                &decision.upstream_host,
                start_time,
            );
            (e.status(), "Upstream request failed").into_response()
        }
    }
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received");
}
