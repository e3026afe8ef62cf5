//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, tunnel dispatch)
//!     → request.rs (request ID)
//!     → [routing resolves upstream host]
//!     → forwarder.rs (outbound leg, full-body buffering)
//!     → [rewrite folds URLs back into the tunnel]
//!     → Send to client
//! ```

pub mod forwarder;
pub mod request;
pub mod server;

pub use request::{MakeRequestUuid, X_REQUEST_ID};
pub use server::HttpServer;
