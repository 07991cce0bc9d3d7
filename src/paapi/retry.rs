//! Bounded retry with exponential backoff.
//!
//! Attempt `n` (1-based) that fails with a retryable error waits
//! `retry_delay * 2^(n-1)` before attempt `n + 1`. After `max_retries`
//! attempts the last error is wrapped in `RetriesExhausted`.

use std::future::Future;
use std::time::Duration;

use tracing::{error, info, warn};

use super::error::{PaapiError, PaapiResult};

/// Upper bound on a single backoff wait.
pub const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Retry configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first.
    pub max_retries: u32,
    /// Base delay; doubled after every failed attempt.
    pub retry_delay: Duration,
    /// Stop immediately on authentication failures instead of retrying them.
    pub fail_fast_on_auth: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_millis(1000),
            fail_fast_on_auth: false,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, retry_delay: Duration) -> Self {
        Self {
            max_retries,
            retry_delay,
            ..Default::default()
        }
    }

    pub fn with_fail_fast_on_auth(mut self, fail_fast: bool) -> Self {
        self.fail_fast_on_auth = fail_fast;
        self
    }
}

/// Backoff before the attempt following failed attempt `attempt` (1-based).
pub fn backoff_delay(attempt: u32, base: Duration) -> Duration {
    let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
    base.saturating_mul(factor).min(MAX_BACKOFF)
}

/// Run `call` until it succeeds, fails permanently, or attempts run out.
///
/// `call` receives the 1-based attempt number. A vendor `Retry-After`
/// acts as a floor on the computed backoff.
pub async fn execute_with_retry<F, Fut, T>(
    policy: &RetryPolicy,
    operation: &str,
    mut call: F,
) -> PaapiResult<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = PaapiResult<T>>,
{
    let max_attempts = policy.max_retries.max(1);
    let mut attempt = 1;

    loop {
        let err = match call(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    info!("{} succeeded on attempt {}", operation, attempt);
                }
                return Ok(value);
            }
            Err(e) => e,
        };

        if !err.is_retryable(policy.fail_fast_on_auth) {
            warn!("{} failed with non-retryable error: {}", operation, err);
            return Err(err);
        }

        if attempt >= max_attempts {
            error!(
                "{} failed after {} attempt(s): {}",
                operation, attempt, err
            );
            return Err(PaapiError::RetriesExhausted {
                attempts: attempt,
                last: Box::new(err),
            });
        }

        let mut wait = backoff_delay(attempt, policy.retry_delay);
        if let Some(retry_after) = err.retry_after() {
            wait = wait.max(retry_after);
        }
        warn!(
            "{} failed (attempt {}/{}), retrying in {:?}: {}",
            operation, attempt, max_attempts, wait, err
        );
        tokio::time::sleep(wait).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    fn server_error() -> PaapiError {
        PaapiError::Server {
            status: 500,
            message: "InternalFailure".to_string(),
        }
    }

    #[test]
    fn test_backoff_delay() {
        let base = Duration::from_millis(1000);
        assert_eq!(backoff_delay(1, base), Duration::from_millis(1000));
        assert_eq!(backoff_delay(2, base), Duration::from_millis(2000));
        assert_eq!(backoff_delay(3, base), Duration::from_millis(4000));
        assert_eq!(backoff_delay(30, base), MAX_BACKOFF);
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_on_third_attempt_after_backoff() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1000));
        let calls = AtomicU32::new(0);
        let begin = Instant::now();

        let result = execute_with_retry(&policy, "GetItems", |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 3 {
                    Err(server_error())
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(Instant::now() - begin >= Duration::from_millis(3000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_wraps_last_error() {
        let policy = RetryPolicy::new(3, Duration::from_millis(10));
        let calls = AtomicU32::new(0);

        let result: PaapiResult<()> = execute_with_retry(&policy, "GetItems", |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                Err(PaapiError::Network(format!("timeout on attempt {}", attempt)))
            }
        })
        .await;

        match result.unwrap_err() {
            PaapiError::RetriesExhausted { attempts, last } => {
                assert_eq!(attempts, 3);
                assert_eq!(last.to_string(), "Network error: timeout on attempt 3");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auth_failures_retried_by_default() {
        let policy = RetryPolicy::new(2, Duration::from_millis(10));
        let calls = AtomicU32::new(0);

        let result: PaapiResult<()> = execute_with_retry(&policy, "GetItems", |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(PaapiError::AuthenticationFailure {
                    status: 401,
                    message: "UnrecognizedClient".to_string(),
                })
            }
        })
        .await;

        assert!(matches!(result, Err(PaapiError::RetriesExhausted { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fail_fast_on_auth() {
        let policy = RetryPolicy::new(5, Duration::from_millis(10)).with_fail_fast_on_auth(true);
        let calls = AtomicU32::new(0);

        let result: PaapiResult<()> = execute_with_retry(&policy, "GetItems", |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(PaapiError::AuthenticationFailure {
                    status: 403,
                    message: "InvalidSignature".to_string(),
                })
            }
        })
        .await;

        assert!(matches!(
            result,
            Err(PaapiError::AuthenticationFailure { status: 403, .. })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_after_floors_backoff() {
        let policy = RetryPolicy::new(2, Duration::from_millis(100));
        let begin = Instant::now();

        let result = execute_with_retry(&policy, "SearchItems", |attempt| async move {
            if attempt == 1 {
                Err(PaapiError::RateLimitExceeded {
                    message: "TooManyRequests".to_string(),
                    retry_after: Some(Duration::from_secs(2)),
                })
            } else {
                Ok(())
            }
        })
        .await;

        assert!(result.is_ok());
        assert!(Instant::now() - begin >= Duration::from_secs(2));
    }
}
