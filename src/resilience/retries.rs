//! Retry logic.
//!
//! # Responsibilities
//! - Decide whether an operation may be retried at all
//! - Re-run transient failures with exponential backoff + jitter
//! - Bound the total number of attempts
//!
//! # Design Decisions
//! - Never retry writes whose effect may already have been applied
//! - Only errors the caller classifies as transient are retried

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::config::RetryConfig;

/// How an operation behaves when repeated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Idempotency {
    /// Safe to repeat (reads, deletes by key, health checks).
    Idempotent,
    /// Repeating could apply the effect twice.
    NonIdempotent,
}

/// Retry settings derived from [`RetryConfig`].
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay_ms: u64,
    max_delay_ms: u64,
}

impl RetryPolicy {
    /// A policy that attempts every operation exactly once.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay_ms: 0,
            max_delay_ms: 0,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        if !config.enabled {
            return Self::none();
        }
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay_ms: config.base_delay_ms,
            max_delay_ms: config.max_delay_ms,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Pause after `failed_attempts` failures: the base delay doubled per
    /// earlier failure, capped at the maximum, plus up to 10% jitter.
    pub fn delay_after(&self, failed_attempts: u32) -> Duration {
        let Some(doublings) = failed_attempts.checked_sub(1) else {
            return Duration::ZERO;
        };
        let factor = 1u64.checked_shl(doublings).unwrap_or(u64::MAX);
        let delay = self
            .base_delay_ms
            .saturating_mul(factor)
            .min(self.max_delay_ms);

        let jitter = match delay / 10 {
            0 => 0,
            spread => rand::thread_rng().gen_range(0..spread),
        };
        Duration::from_millis(delay + jitter)
    }

    /// Run `op`, retrying transient failures when the operation is idempotent.
    pub async fn run<T, E, F, Fut>(
        &self,
        operation: &'static str,
        idempotency: Idempotency,
        is_transient: impl Fn(&E) -> bool,
        mut op: F,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let max_attempts = match idempotency {
            Idempotency::Idempotent => self.max_attempts,
            Idempotency::NonIdempotent => 1,
        };

        let mut attempts = 0;
        loop {
            attempts += 1;
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempts < max_attempts && is_transient(&e) => {
                    let delay = self.delay_after(attempts);
                    tracing::warn!(
                        operation,
                        attempt = attempts,
                        delay = ?delay,
                        error = %e,
                        "Transient failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}
