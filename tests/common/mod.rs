//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use caldav_tunnel::config::{ProxyConfig, TunnelConfig};
use caldav_tunnel::http::HttpServer;

/// Start a mock upstream answering every request with a fixed status
/// line, extra header lines, and body. Returns the request heads it saw.
pub async fn start_mock_upstream(
    addr: SocketAddr,
    status_line: &'static str,
    extra_headers: &'static str,
    body: &'static str,
) -> Arc<Mutex<Vec<String>>> {
    let listener = TcpListener::bind(addr).await.unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_tx = seen.clone();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let seen = seen_tx.clone();
                    tokio::spawn(async move {
                        let mut buf = vec![0u8; 8192];
                        let mut head = Vec::new();
                        loop {
                            match socket.read(&mut buf).await {
                                Ok(0) => break,
                                Ok(n) => {
                                    head.extend_from_slice(&buf[..n]);
                                    if head.windows(4).any(|w| w == b"\r\n\r\n") {
                                        break;
                                    }
                                }
                                Err(_) => return,
                            }
                        }
                        seen.lock()
                            .unwrap()
                            .push(String::from_utf8_lossy(&head).into_owned());

                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Length: {}\r\n{}Connection: close\r\n\r\n{}",
                            status_line,
                            body.len(),
                            extra_headers,
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    seen
}

/// Start a mock upstream that accepts connections and never answers.
#[allow(dead_code)]
pub async fn start_stalling_upstream(addr: SocketAddr) {
    let listener = TcpListener::bind(addr).await.unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    tokio::spawn(async move {
                        let _socket = socket;
                        tokio::time::sleep(std::time::Duration::from_secs(60)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });
}

/// Build a tunnel config for tests (plain HTTP to local mocks).
pub fn tunnel(prefix: &str, default_host: &str) -> TunnelConfig {
    TunnelConfig {
        prefix: prefix.to_string(),
        default_host: default_host.to_string(),
        upstream_scheme: "http".to_string(),
    }
}

/// Proxy config listening on `addr` with the given tunnels.
pub fn proxy_config(addr: SocketAddr, tunnels: Vec<TunnelConfig>) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.listener.bind_address = addr.to_string();
    config.tunnels = tunnels;
    config
}

/// Spawn the proxy.
pub async fn start_proxy(config: ProxyConfig) {
    let addr: SocketAddr = config.listener.bind_address.parse().unwrap();
    let server = HttpServer::new(config);
    let listener = TcpListener::bind(addr).await.unwrap();
    tokio::spawn(async move {
        let _ = server.run(listener).await;
    });
}
