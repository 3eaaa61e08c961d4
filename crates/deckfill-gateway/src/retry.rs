//! Retry policy for remote calls
//!
//! Only rate-limit and transient failures are retried, and callers may narrow
//! that further per request. Backoff doubles after every failed attempt.

use std::time::Duration;

use deckfill_core::{GatewayError, GatewayResult};

/// Attempts and backoff for one gateway call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included
    pub max_attempts: u32,
    /// Wait before the second attempt
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
        }
    }

    /// Wait after failed attempt `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff.saturating_mul(factor)
    }

    /// Run `call` until it succeeds, fails permanently, or attempts run out
    pub fn run<T>(
        &self,
        what: &str,
        call: impl FnMut() -> GatewayResult<T>,
    ) -> GatewayResult<T> {
        self.run_if(what, GatewayError::is_retryable, call)
    }

    /// Like [`run`](Self::run), retrying only errors `retryable` accepts
    pub fn run_if<T>(
        &self,
        what: &str,
        retryable: impl Fn(&GatewayError) -> bool,
        mut call: impl FnMut() -> GatewayResult<T>,
    ) -> GatewayResult<T> {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match call() {
                Err(e) if retryable(&e) && attempt < attempts => {
                    let wait = self.backoff(attempt);
                    tracing::warn!(
                        call = what,
                        attempt,
                        wait_ms = wait.as_millis() as u64,
                        error = %e,
                        "retrying after failure"
                    );
                    std::thread::sleep(wait);
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}
