//! Authentication subsystem.
//!
//! # Data Flow
//! ```text
//! Authorization: Bearer <token>
//!     → middleware.rs (once per protected request)
//!     → verifier.rs (HS256 signature + expiry)
//!     → AuthenticatedUser in request extensions
//!     → handlers extract it (401 when absent)
//! ```

pub mod middleware;
pub mod verifier;

pub use middleware::{authenticate, AuthenticatedUser};
pub use verifier::{CredentialVerifier, UserClaims, VerifyError};
