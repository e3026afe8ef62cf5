//! CalDAV tunneling reverse proxy.
//!
//! Sits between a browser calendar client and one or more CalDAV
//! servers. Requests under a mounted tunnel prefix are forwarded to the
//! upstream encoded in the path (or a configured default), and every
//! absolute URL the upstream embeds in its XML responses is rewritten
//! to point back through the proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                ┌──────────────────────────────────────────────┐
//!                │                CALDAV TUNNEL                  │
//!                │                                               │
//!  Client ───────┼─▶ http/server ──▶ routing ──▶ http/forwarder ─┼──▶ CalDAV
//!                │      (axum)      (resolver)     (reqwest)     │    server
//!                │                                               │
//!  Client ◀──────┼── rewrite ◀───── buffered response ◀──────────┼────
//!                │  (urls, hrefs,                                │
//!                │   Location)                                   │
//!                │                                               │
//!                │  config · observability (tracing, metrics)    │
//!                └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use caldav_tunnel::config::loader::load_config;
use caldav_tunnel::config::ProxyConfig;
use caldav_tunnel::http::HttpServer;
use caldav_tunnel::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "caldav-tunnel")]
#[command(about = "Host- and body-rewriting reverse proxy for CalDAV upstreams")]
struct Cli {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };

    logging::init_logging(&config.observability);

    tracing::info!(
        bind_address = %config.listener.bind_address,
        tunnels = config.tunnels.len(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );
    for tunnel in &config.tunnels {
        tracing::info!(
            prefix = %tunnel.prefix,
            default_host = %tunnel.default_host,
            scheme = %tunnel.upstream_scheme,
            "Tunnel mounted"
        );
    }

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!(address = %local_addr, "Listening for connections");

    let server = HttpServer::new(config);
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
