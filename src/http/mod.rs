//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum setup, tower-http layers)
//!     → request.rs (request ID assigned and propagated)
//!     → routing layer picks a handler
//!     → handlers/ (user, experience, words)
//!     → response.rs (error bodies, relayed upstream answers)
//!     → client
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestIdExt, UuidRequestId, X_REQUEST_ID};
pub use response::ErrorBody;
pub use server::{AppState, HttpServer};
