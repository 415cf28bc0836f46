//! Bounded retry for source reads
//!
//! Transient connectivity failures against either source system are retried
//! with a fixed inter-attempt delay. There is no backoff curve: the sources
//! are nightly batch databases and either recover within a minute or are
//! down for the run.

use crate::config::RetryConfig;
use crate::domain::SourceError;
use std::future::Future;
use std::time::Duration;

/// Runs `op` up to `retry.max_attempts` times with a fixed delay in between
///
/// Returns the first success, or the last error once the budget is spent.
pub async fn with_retry<T, F, Fut>(
    system: &str,
    retry: &RetryConfig,
    mut op: F,
) -> Result<T, SourceError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SourceError>>,
{
    let mut last_err = None;

    for attempt in 1..=retry.max_attempts {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                tracing::warn!(
                    system = system,
                    attempt = attempt,
                    max_attempts = retry.max_attempts,
                    error = %e,
                    "Source read failed"
                );
                last_err = Some(e);
                if attempt < retry.max_attempts {
                    tokio::time::sleep(Duration::from_secs(retry.delay_seconds)).await;
                }
            }
        }
    }

    Err(last_err.unwrap_or_else(|| SourceError::ConnectionFailed {
        system: system.to_string(),
        message: "retry budget exhausted".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast_retry(max_attempts: usize) -> RetryConfig {
        RetryConfig {
            max_attempts,
            delay_seconds: 0,
        }
    }

    #[tokio::test]
    async fn test_succeeds_first_attempt() {
        let calls = AtomicUsize::new(0);
        let result = with_retry("erp", &fast_retry(3), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, SourceError>(42) }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failure() {
        let calls = AtomicUsize::new(0);
        let result = with_retry("erp", &fast_retry(3), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(SourceError::ConnectionFailed {
                        system: "erp".to_string(),
                        message: "timeout".to_string(),
                    })
                } else {
                    Ok(7)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausts_budget() {
        let calls = AtomicUsize::new(0);
        let result: Result<i32, _> = with_retry("ticketing", &fast_retry(3), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(SourceError::ConnectionFailed {
                    system: "ticketing".to_string(),
                    message: "refused".to_string(),
                })
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
