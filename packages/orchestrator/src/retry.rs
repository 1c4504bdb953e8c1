//! Retry and error recovery utilities for the relay loops
//!
//! Retry belongs to the I/O edges only: the commitment builders are pure and
//! deterministic, so re-running them with the same input is pointless. The
//! loops wrap their LCD/RPC/signer calls in `with_retry` and let everything
//! else bubble up.

use eyre::{eyre, Result};
use std::time::Duration;
use tracing::{debug, warn};

/// Transmission retry configuration
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Initial backoff duration
    pub initial_backoff: Duration,
    /// Maximum backoff duration
    pub max_backoff: Duration,
    /// Backoff multiplier for exponential growth
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_backoff: Duration::from_secs(2),
            max_backoff: Duration::from_secs(60),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Calculate backoff duration for a given attempt (0-indexed)
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let backoff_secs =
            self.initial_backoff.as_secs_f64() * self.backoff_multiplier.powi(attempt as i32);
        let capped = backoff_secs.min(self.max_backoff.as_secs_f64());
        Duration::from_secs_f64(capped)
    }

    /// Check if we should retry based on attempt count
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }
}

/// Classifies errors for retry decisions
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorClass {
    /// Temporary failure - should retry (timeout, network issues)
    Transient,
    /// Permanent failure - do not retry (rejected request, bad data)
    Permanent,
    /// Unknown error - may retry with backoff
    Unknown,
}

/// Classify an error for retry decisions
pub fn classify_error(error: &str) -> ErrorClass {
    let error_lower = error.to_lowercase();

    // Transient errors
    if error_lower.contains("timeout")
        || error_lower.contains("timed out")
        || error_lower.contains("connection")
        || error_lower.contains("network")
        || error_lower.contains("rate limit")
        || error_lower.contains("too many requests")
        || error_lower.contains("503")
        || error_lower.contains("502")
        || error_lower.contains("temporarily unavailable")
    {
        return ErrorClass::Transient;
    }

    // Permanent errors
    if error_lower.contains("invalid signature")
        || error_lower.contains("unauthorized")
        || error_lower.contains("already confirmed")
        || error_lower.contains("unknown nonce")
        || error_lower.contains("bad request")
    {
        return ErrorClass::Permanent;
    }

    ErrorClass::Unknown
}

/// Execute with retry logic
pub async fn with_retry<F, T, Fut>(config: &RetryConfig, mut operation: F) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut attempt = 0u32;

    loop {
        match operation(attempt).await {
            Ok(result) => return Ok(result),
            Err(e) => {
                let error_str = e.to_string();
                attempt += 1;

                match classify_error(&error_str) {
                    ErrorClass::Permanent => {
                        warn!(error = %error_str, "Permanent error - giving up");
                        return Err(eyre!("Permanent failure: {}", error_str));
                    }
                    ErrorClass::Transient | ErrorClass::Unknown => {
                        if !config.should_retry(attempt) {
                            return Err(e);
                        }
                        let backoff = config.backoff_for_attempt(attempt - 1);
                        debug!(
                            ?backoff,
                            attempt,
                            error = %error_str,
                            "Retrying after backoff"
                        );
                        tokio::time::sleep(backoff).await;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_backoff_calculation() {
        let config = RetryConfig::default();

        assert_eq!(config.backoff_for_attempt(0), Duration::from_secs(2));
        assert_eq!(config.backoff_for_attempt(1), Duration::from_secs(4));
        assert_eq!(config.backoff_for_attempt(2), Duration::from_secs(8));
        assert_eq!(config.backoff_for_attempt(3), Duration::from_secs(16));
        assert_eq!(config.backoff_for_attempt(4), Duration::from_secs(32));
        assert_eq!(config.backoff_for_attempt(5), Duration::from_secs(60)); // capped
    }

    #[test]
    fn test_error_classification() {
        assert_eq!(classify_error("connection timeout"), ErrorClass::Transient);
        assert_eq!(classify_error("HTTP 503 from LCD"), ErrorClass::Transient);
        assert_eq!(classify_error("invalid signature"), ErrorClass::Permanent);
        assert_eq!(classify_error("some unknown error"), ErrorClass::Unknown);
    }

    #[tokio::test]
    async fn test_with_retry_succeeds_after_transient_failures() {
        let config = RetryConfig {
            max_retries: 3,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(2),
            backoff_multiplier: 2.0,
        };
        let calls = AtomicUsize::new(0);

        let result = with_retry(&config, |_| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(eyre!("connection reset"))
                } else {
                    Ok(42)
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(result, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_with_retry_stops_on_permanent_error() {
        let config = RetryConfig::default();
        let calls = AtomicUsize::new(0);

        let result: Result<()> = with_retry(&config, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(eyre!("invalid signature")) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_with_retry_exhausts_attempts() {
        let config = RetryConfig {
            max_retries: 2,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(1),
            backoff_multiplier: 1.0,
        };
        let calls = AtomicUsize::new(0);

        let result: Result<()> = with_retry(&config, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(eyre!("random failure")) }
        })
        .await;

        assert!(result.is_err());
        // initial attempt plus two retries
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
