//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Store operation:
//!     → retries.rs (only for operations marked retryable)
//!     → On transient failure: exponential delay + jitter
//!     → Give up after max_attempts; error surfaces to the handler
//! ```
//!
//! # Design Decisions
//! - Upstream HTTP calls are never retried; every call is attempted once
//! - Non-idempotent store writes (insert, increment) are never retried
//! - Jittered backoff prevents thundering herd on reconnect

pub mod retries;
