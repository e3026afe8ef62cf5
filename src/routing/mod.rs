//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request path
//!     → router.rs (which mounted tunnel owns this path?)
//!     → resolver.rs (which upstream host, which residual path?)
//!     → Return: RouteDecision used by forwarder and rewriter
//! ```
//!
//! # Design Decisions
//! - Tunnels compiled at startup, immutable at runtime
//! - Longest prefix wins, on path-segment boundaries
//! - Host extraction is a pure function with no error cases

pub mod resolver;
pub mod router;

pub use resolver::{resolve_route, RouteDecision};
pub use router::{Tunnel, TunnelTable};
