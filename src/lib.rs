//! Host- and body-rewriting reverse proxy for CalDAV-style upstreams.

pub mod config;
pub mod http;
pub mod observability;
pub mod rewrite;
pub mod routing;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
