//! Retry of transient store conflicts
//!
//! Store writes use compare-and-set updates; losing a race or hitting a busy SQLite
//! database surfaces as `ProgressError::StoreUnavailable`. The whole operation
//! is then re-run from scratch, which is safe because a submission can only
//! leave PENDING once.

use std::future::Future;
use std::time::{Duration, Instant};

use crate::progress::{ProgressError, ProgressResult};

const INITIAL_BACKOFF_MS: u64 = 10;
const MAX_BACKOFF_MS: u64 = 1000;

/// Re-run `operation` with exponential backoff while it fails with a
/// retryable error, for at most `max_wait_ms` in total
///
/// Backoff starts at 10ms and doubles per attempt, capped at 1s. Other
/// errors are returned immediately. When the time budget is spent the last
/// retryable error is returned unchanged.
pub async fn retry_on_conflict<F, Fut, T>(
    operation_name: &str,
    max_wait_ms: u64,
    mut operation: F,
) -> ProgressResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ProgressResult<T>>,
{
    let start_time = Instant::now();
    let max_duration = Duration::from_millis(max_wait_ms);
    let mut attempt = 0u32;
    let mut backoff_ms = INITIAL_BACKOFF_MS;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::debug!(
                        operation = operation_name,
                        attempt,
                        elapsed_ms = start_time.elapsed().as_millis() as u64,
                        "Operation succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(err) if !err.is_retryable() => return Err(err),
            Err(err) => {
                let elapsed = start_time.elapsed();
                if elapsed >= max_duration {
                    tracing::error!(
                        operation = operation_name,
                        attempt,
                        elapsed_ms = elapsed.as_millis() as u64,
                        max_wait_ms,
                        error = %err,
                        "Giving up: max retry time exceeded"
                    );
                    return Err(err);
                }

                let sleep_ms = backoff_ms.min(max_duration.saturating_sub(elapsed).as_millis() as u64);
                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    backoff_ms = sleep_ms,
                    error = %err,
                    "Store conflict, retrying after backoff"
                );

                tokio::time::sleep(Duration::from_millis(sleep_ms)).await;
                backoff_ms = (backoff_ms * 2).min(MAX_BACKOFF_MS);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_succeeds_first_attempt() {
        let result = retry_on_conflict("test_op", 5000, || async { Ok::<i32, ProgressError>(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_succeeds_after_conflicts() {
        let attempts = Arc::new(AtomicU32::new(0));

        let counter = attempts.clone();
        let result = retry_on_conflict("test_op", 5000, move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n < 3 {
                    Err(ProgressError::StoreUnavailable("lost race".to_string()))
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_wait() {
        let started = Instant::now();
        let result = retry_on_conflict("test_op", 50, || async {
            Err::<i32, _>(ProgressError::StoreUnavailable("database is locked".to_string()))
        })
        .await;

        assert!(matches!(result, Err(ProgressError::StoreUnavailable(_))));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_domain_errors_are_not_retried() {
        let attempts = Arc::new(AtomicU32::new(0));

        let counter = attempts.clone();
        let result = retry_on_conflict("test_op", 5000, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err::<i32, _>(ProgressError::AlreadyReviewed(uuid::Uuid::new_v4())) }
        })
        .await;

        assert!(matches!(result, Err(ProgressError::AlreadyReviewed(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
