//! Retry logic with exponential backoff
//!
//! The retry policy ([`RetryConfig`]) is kept apart from the action being
//! retried. Two combinators share it:
//!
//! - [`download_with_retry`] for self-contained operations (a closure returning a future)
//! - [`retry_with_state`] for actions that need mutable access to the caller's
//!   state on every attempt, such as a downloader rotating its HTTP session
//!
//! # Example
//!
//! ```no_run
//! use icon_dl::retry::{IsRetryable, download_with_retry};
//! use icon_dl::config::RetryConfig;
//!
//! #[derive(Debug)]
//! enum MyError {
//!     Transient,
//!     Permanent,
//! }
//!
//! impl std::fmt::Display for MyError {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//!         write!(f, "{self:?}")
//!     }
//! }
//!
//! impl IsRetryable for MyError {
//!     fn is_retryable(&self) -> bool {
//!         matches!(self, MyError::Transient)
//!     }
//! }
//!
//! # async fn example() -> Result<(), MyError> {
//! let config = RetryConfig::default();
//! download_with_retry(&config, || async { Ok::<_, MyError>(()) }).await?;
//! # Ok(())
//! # }
//! ```

use crate::config::RetryConfig;
use crate::error::{AttemptError, Error};
use futures::future::BoxFuture;
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Trait for errors that can be classified as retryable or not
///
/// Transient failures (timeouts, corrupted downloads) should return `true`.
/// Permanent failures (premium content, bad configuration) should return `false`.
pub trait IsRetryable {
    /// Returns true if the error is transient and the operation should be retried
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            Error::Network(e) => e.is_timeout() || e.is_connect(),
            Error::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::ConnectionRefused
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::Interrupted
            ),
            // Rate limits and server-side hiccups clear up on their own
            Error::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            Error::Config { .. }
            | Error::Serialization(_)
            | Error::InvalidPattern(_)
            | Error::InvalidUrl(_)
            | Error::Other(_) => false,
        }
    }
}

impl IsRetryable for AttemptError {
    fn is_retryable(&self) -> bool {
        match self {
            AttemptError::Corrupted { .. } => true,
            AttemptError::Premium { .. } => false,
        }
    }
}

/// Execute an async operation under the retry policy
///
/// The operation runs at most `config.max_attempts` times (at least once).
/// Returns the first success, the first non-retryable error, or the last
/// error once attempts are exhausted.
pub async fn download_with_retry<F, Fut, T, E>(config: &RetryConfig, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1;
    let mut delay = config.initial_delay;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::info!(attempts = attempt, "Operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                tracing::warn!(
                    error = %e,
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis(),
                    "Operation failed, retrying"
                );
                pause(config, delay).await;
                delay = next_delay(config, delay);
                attempt += 1;
            }
            Err(e) => {
                log_give_up(&e, attempt);
                return Err(e);
            }
        }
    }
}

/// Execute an attempt function that borrows `state` mutably on each attempt
///
/// Same policy as [`download_with_retry`]. The attempt function also receives
/// the 1-based attempt number.
pub async fn retry_with_state<S, T, E, F>(
    config: &RetryConfig,
    state: &mut S,
    mut attempt_fn: F,
) -> Result<T, E>
where
    S: ?Sized,
    F: for<'a> FnMut(&'a mut S, u32) -> BoxFuture<'a, Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1;
    let mut delay = config.initial_delay;

    loop {
        match attempt_fn(state, attempt).await {
            Ok(result) => return Ok(result),
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                tracing::debug!(error = %e, attempt, max_attempts, "attempt failed, retrying");
                pause(config, delay).await;
                delay = next_delay(config, delay);
                attempt += 1;
            }
            Err(e) => {
                log_give_up(&e, attempt);
                return Err(e);
            }
        }
    }
}

fn log_give_up<E: IsRetryable + std::fmt::Display>(e: &E, attempts: u32) {
    if e.is_retryable() {
        tracing::debug!(error = %e, attempts, "giving up after all attempts exhausted");
    } else {
        tracing::debug!(error = %e, attempts, "giving up on non-retryable error");
    }
}

async fn pause(config: &RetryConfig, delay: Duration) {
    if delay.is_zero() {
        return;
    }
    let delay = if config.jitter { add_jitter(delay) } else { delay };
    tokio::time::sleep(delay).await;
}

fn next_delay(config: &RetryConfig, delay: Duration) -> Duration {
    Duration::from_secs_f64(delay.as_secs_f64() * config.backoff_multiplier).min(config.max_delay)
}

/// Add random jitter to a delay
///
/// The result is uniformly distributed between `delay` and `2 * delay`.
fn add_jitter(delay: Duration) -> Duration {
    let mut rng = rand::thread_rng();
    let jitter_factor: f64 = rng.gen_range(0.0..=1.0);
    Duration::from_secs_f64(delay.as_secs_f64() * (1.0 + jitter_factor))
}

/// `base` plus a uniform random extra in `[min, max]`
///
/// Used for rate-limit backoff. An inverted range yields `base + min`.
pub fn jittered(base: Duration, min: Duration, max: Duration) -> Duration {
    if max <= min {
        return base + min;
    }
    let extra = rand::thread_rng().gen_range(min.as_secs_f64()..=max.as_secs_f64());
    base + Duration::from_secs_f64(extra)
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug)]
    enum TestError {
        Transient,
        Permanent,
    }

    impl std::fmt::Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                TestError::Transient => write!(f, "transient error"),
                TestError::Permanent => write!(f, "permanent error"),
            }
        }
    }

    impl IsRetryable for TestError {
        fn is_retryable(&self) -> bool {
            matches!(self, TestError::Transient)
        }
    }

    fn quick(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_secs(1),
            backoff_multiplier: 2.0,
            jitter: false,
        }
    }

    #[tokio::test]
    async fn test_success_no_retry() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = download_with_retry(&quick(3), || {
            let counter = counter_clone.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, TestError>(42)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(counter.load(Ordering::SeqCst), 1, "should only call once");
    }

    #[tokio::test]
    async fn test_retry_transient_then_succeed() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = download_with_retry(&quick(3), || {
            let counter = counter_clone.clone();
            async move {
                let count = counter.fetch_add(1, Ordering::SeqCst);
                if count < 2 {
                    Err(TestError::Transient)
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_attempts_are_capped_by_max_attempts() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = download_with_retry(&quick(2), || {
            let counter = counter_clone.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<i32, _>(TestError::Transient)
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(
            counter.load(Ordering::SeqCst),
            2,
            "max_attempts counts the first attempt"
        );
    }

    #[tokio::test]
    async fn test_permanent_error_no_retry() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = download_with_retry(&quick(5), || {
            let counter = counter_clone.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<i32, _>(TestError::Permanent)
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_zero_attempts_still_runs_once() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let _ = download_with_retry(&quick(0), || {
            let counter = counter_clone.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<i32, _>(TestError::Transient)
            }
        })
        .await;

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_exponential_backoff() {
        let start = std::time::Instant::now();

        let _result = download_with_retry(&quick(4), || async {
            Err::<i32, _>(TestError::Transient)
        })
        .await;

        // 10ms + 20ms + 40ms between the four attempts
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(70), "waited {elapsed:?}");
        assert!(elapsed < Duration::from_secs(2), "waited {elapsed:?}");
    }

    #[test]
    fn test_next_delay_is_capped() {
        let config = RetryConfig {
            max_attempts: 5,
            initial_delay: Duration::from_millis(50),
            max_delay: Duration::from_millis(200),
            backoff_multiplier: 10.0,
            jitter: false,
        };
        let second = next_delay(&config, config.initial_delay);
        assert_eq!(second, Duration::from_millis(200));
        assert_eq!(next_delay(&config, second), Duration::from_millis(200));
    }

    #[test]
    fn test_jitter_bounds() {
        let delay = Duration::from_millis(100);
        for _ in 0..20 {
            let jittered = add_jitter(delay);
            assert!(jittered >= delay);
            assert!(jittered <= delay * 2);
        }
    }

    #[test]
    fn test_rate_limit_jitter_range() {
        let base = Duration::from_secs(5);
        for _ in 0..20 {
            let d = jittered(base, Duration::from_secs(2), Duration::from_secs(3));
            assert!(d >= Duration::from_secs(7), "{d:?}");
            assert!(d <= Duration::from_secs(8), "{d:?}");
        }
        assert_eq!(
            jittered(base, Duration::from_secs(1), Duration::from_secs(1)),
            Duration::from_secs(6)
        );
        assert_eq!(jittered(Duration::ZERO, Duration::ZERO, Duration::ZERO), Duration::ZERO);
    }

    struct Counter {
        calls: Vec<u32>,
        fail_until: u32,
    }

    impl Counter {
        async fn step(&mut self, attempt: u32) -> Result<u32, TestError> {
            self.calls.push(attempt);
            if attempt < self.fail_until {
                Err(TestError::Transient)
            } else {
                Ok(attempt)
            }
        }
    }

    #[tokio::test]
    async fn test_stateful_retry_passes_attempt_numbers() {
        let mut state = Counter {
            calls: Vec::new(),
            fail_until: 3,
        };

        let result = retry_with_state(&quick(5), &mut state, |s, attempt| {
            Box::pin(s.step(attempt))
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(state.calls, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_stateful_retry_stops_on_permanent() {
        let mut calls = 0u32;

        let result: Result<(), TestError> =
            retry_with_state(&quick(5), &mut calls, |calls, _attempt| {
                Box::pin(async move {
                    *calls += 1;
                    Err(TestError::Permanent)
                })
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_stateful_retry_exhausts() {
        let mut state = Counter {
            calls: Vec::new(),
            fail_until: u32::MAX,
        };

        let result = retry_with_state(&quick(4), &mut state, |s, attempt| {
            Box::pin(s.step(attempt))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(state.calls, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_error_is_retryable_io() {
        let timeout_err = Error::Io(std::io::Error::new(std::io::ErrorKind::TimedOut, "timeout"));
        assert!(timeout_err.is_retryable());

        let not_found = Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert!(!not_found.is_retryable());
    }

    #[test]
    fn test_error_is_retryable_http_status() {
        let status = |status| Error::HttpStatus {
            url: "https://example.com".into(),
            status,
        };
        assert!(status(503).is_retryable());
        assert!(status(429).is_retryable());
        assert!(!status(404).is_retryable());
        assert!(!Error::config("bad", "icon_dir").is_retryable());
    }

    #[test]
    fn test_attempt_error_classification() {
        assert!(
            AttemptError::Corrupted {
                vector_valid: false,
                raster_valid: true
            }
            .is_retryable()
        );
        assert!(
            !AttemptError::Premium {
                url: "https://example.com/svg".into()
            }
            .is_retryable()
        );
    }
}
