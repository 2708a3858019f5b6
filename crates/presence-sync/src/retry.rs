//! # Retry Combinator
//!
//! Bounded exponential-backoff retry around arbitrary fallible async
//! operations.
//!
//! ## Retry Timeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Remote Call Retry Policy                            │
//! │                                                                         │
//! │  attempt 1 ──fail──► wait 2s ──► attempt 2 ──fail──► wait 4s ──►       │
//! │  attempt 3 ──fail──► propagate the final error unchanged                │
//! │                                                                         │
//! │  • 2 retries (3 total attempts)                                         │
//! │  • delay = 2^attempt seconds, no jitter                                 │
//! │  • retries on ANY error - auth failures included. That coarseness is    │
//! │    inherited from the reference behavior; SyncError::is_auth_error()   │
//! │    exists for a future policy that stops retrying those.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The combinator is generic over the error type so call sites outside
//! the presence client can reuse it without adapting their errors.

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

// =============================================================================
// Retry Policy
// =============================================================================

/// Parameters for [`retry`].
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries after the first attempt (2 → 3 total attempts).
    pub max_retries: u32,

    /// First delay; each subsequent delay doubles.
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_retries: 2,
            initial_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries (single attempt).
    pub fn none() -> Self {
        RetryPolicy {
            max_retries: 0,
            initial_delay: Duration::ZERO,
        }
    }

    /// Builds the delay sequence for one retried operation.
    ///
    /// randomization_factor 0 keeps the sequence exactly 2^attempt
    /// seconds; max_elapsed_time None leaves the attempt count as the
    /// only bound.
    fn delays(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: self.initial_delay,
            current_interval: self.initial_delay,
            randomization_factor: 0.0,
            multiplier: 2.0,
            max_interval: Duration::from_secs(3600),
            max_elapsed_time: None,
            ..Default::default()
        }
    }
}

// =============================================================================
// Retry Combinator
// =============================================================================

/// Runs `op`, retrying per `policy` on any error.
///
/// The final error is propagated unchanged; intermediate failures are
/// logged at warn level with the attempt number.
pub async fn retry<T, E, F, Fut>(policy: &RetryPolicy, operation: &str, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut delays = policy.delays();

    for attempt in 1..=policy.max_retries + 1 {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt <= policy.max_retries => {
                // delays() never returns None with max_elapsed_time unset.
                let delay = delays.next_backoff().unwrap_or(policy.initial_delay);
                warn!(
                    operation,
                    attempt,
                    delay_secs = delay.as_secs(),
                    error = %e,
                    "Remote call failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }

    unreachable!("retry loop covers every attempt")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    /// An operation that fails `failures` times, then succeeds.
    fn flaky(failures: u32) -> (Arc<AtomicU32>, impl FnMut() -> std::future::Ready<Result<u32, String>>)
    {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let op = move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            if n <= failures {
                std::future::ready(Err(format!("failure {}", n)))
            } else {
                std::future::ready(Ok(n))
            }
        };
        (calls, op)
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_success_makes_one_attempt() {
        let (calls, op) = flaky(0);
        let result = retry(&RetryPolicy::default(), "test", op).await;
        assert_eq!(result, Ok(1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_within_retry_budget() {
        let (calls, op) = flaky(2);
        let result = retry(&RetryPolicy::default(), "test", op).await;
        assert_eq!(result, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausts_and_propagates_final_error() {
        let (calls, op) = flaky(3);
        let result = retry(&RetryPolicy::default(), "test", op).await;
        assert_eq!(result, Err("failure 3".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_sequence_is_two_then_four_seconds() {
        let start = tokio::time::Instant::now();
        let (_, op) = flaky(2);
        retry(&RetryPolicy::default(), "test", op).await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_none_policy_never_sleeps() {
        let start = tokio::time::Instant::now();
        let (calls, op) = flaky(1);
        let result = retry(&RetryPolicy::none(), "test", op).await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
