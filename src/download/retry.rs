//! Retry logic with exponential backoff.
//!
//! Only transient transport failures are retried: timeouts, refused
//! connections, rate limiting and server-side 5xx answers. Remote refusals
//! such as an export exceeding the conversion size limit fail immediately.

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::config::RetryConfig;
use crate::error::Error;

/// Classifies errors as worth retrying or not.
pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            Error::Http(e) => e.is_timeout() || e.is_connect() || e.is_body(),
            Error::RateLimited => true,
            Error::HttpStatus { status, .. } => *status >= 500,
            Error::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::ConnectionRefused
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::Interrupted
            ),
            _ => false,
        }
    }
}

/// Run `operation`, retrying retryable failures as configured.
pub async fn with_retry<F, Fut, T, E>(config: &RetryConfig, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
{
    let mut attempt = 0;
    let mut delay = config.initial_delay();

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    tracing::info!(attempts = attempt + 1, "Operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) if e.is_retryable() && attempt < config.max_attempts => {
                attempt += 1;

                tracing::warn!(
                    error = %e,
                    attempt = attempt,
                    max_attempts = config.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "Request failed, retrying"
                );

                let wait = if config.jitter { add_jitter(delay) } else { delay };
                tokio::time::sleep(wait).await;

                let next = Duration::from_secs_f64(delay.as_secs_f64() * config.backoff_multiplier);
                delay = next.min(config.max_delay());
            }
            Err(e) => return Err(e),
        }
    }
}

/// Stretch a delay by a random factor between 1 and 2.
fn add_jitter(delay: Duration) -> Duration {
    let factor: f64 = rand::thread_rng().gen_range(0.0..=1.0);
    Duration::from_secs_f64(delay.as_secs_f64() * (1.0 + factor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio_test::{assert_err, assert_ok};

    fn fast_config(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            initial_delay_ms: 1,
            max_delay_ms: 2,
            backoff_multiplier: 2.0,
            jitter: false,
        }
    }

    #[tokio::test]
    async fn test_success_without_retry() {
        let calls = &AtomicU32::new(0);
        let result: Result<u32, Error> = with_retry(&fast_config(3), || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(7)
        })
        .await;

        assert_eq!(assert_ok!(result), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retries_transient_errors() {
        let calls = &AtomicU32::new(0);
        let result: Result<&str, Error> = with_retry(&fast_config(3), || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(Error::RateLimited)
            } else {
                Ok("done")
            }
        })
        .await;

        assert_eq!(assert_ok!(result), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = &AtomicU32::new(0);
        let result: Result<(), Error> = with_retry(&fast_config(2), || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(Error::HttpStatus {
                status: 503,
                url: "u".into(),
                message: "busy".into(),
            })
        })
        .await;

        assert_err!(result);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_does_not_retry_remote_refusals() {
        let calls = &AtomicU32::new(0);
        let result: Result<(), Error> = with_retry(&fast_config(5), || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(Error::HttpStatus {
                status: 403,
                url: "u".into(),
                message: "exportSizeLimitExceeded".into(),
            })
        })
        .await;

        assert_err!(result);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_disabled_policy() {
        let calls = &AtomicU32::new(0);
        let result: Result<(), Error> = with_retry(&RetryConfig::disabled(), || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(Error::RateLimited)
        })
        .await;

        assert_err!(result);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_classification() {
        assert!(Error::RateLimited.is_retryable());
        assert!(!Error::FileExists("x".into()).is_retryable());
        assert!(!Error::Authentication("expired".into()).is_retryable());
    }
}
