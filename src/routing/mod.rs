//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (method, path)
//!     → router.rs (axum route table under /api/{version})
//!     → auth middleware on protected routes
//!     → handler, or the SERVER_GATEWAY fallback
//!
//! Metrics labelling:
//!     path → matcher.rs (RouteGroup) → request counters
//! ```
//!
//! # Design Decisions
//! - Routes built once at startup, immutable at runtime
//! - Dispatch is method + path only; the version token is plain interpolation
//! - Prefix matching only, no regex

pub mod matcher;
pub mod router;

pub use matcher::RouteGroup;
pub use router::{api_prefix, build_routes};
