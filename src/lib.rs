//! Lingo gateway library.
//!
//! HTTP gateway for the language-learning application: authenticates
//! callers, forwards account and word-catalogue requests to their upstream
//! services, and keeps a per-user experience counter in MySQL.

// Core subsystems
pub mod auth;
pub mod config;
pub mod delegates;
pub mod http;
pub mod routing;
pub mod store;

// Cross-cutting concerns
pub mod error;
pub mod health;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::schema::GatewayConfig;
pub use error::GatewayError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
