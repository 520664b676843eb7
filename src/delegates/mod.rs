//! Delegates to the upstream services.
//!
//! # Data Flow
//! ```text
//! handlers
//!     → AuthDelegate  → identity service (+ ExperienceStore for signup/profile)
//!     → WordsDelegate → identity service (gate) → words service
//!     → UpstreamClient (reqwest, one attempt per call)
//! ```

pub mod auth;
pub mod upstream;
pub mod words;

pub use auth::{AuthDelegate, SignupResult};
pub use upstream::{Relayed, UpstreamClient, UpstreamError};
pub use words::WordsDelegate;

/// Service label used in logs and metrics for the identity service.
pub const IDENTITY_SERVICE: &str = "identity";
/// Service label used in logs and metrics for the words service.
pub const WORDS_SERVICE: &str = "words";
