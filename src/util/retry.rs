use crate::storage::error::{StorageError, StorageResult};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{error, warn};

/// Number of attempts made for every remote call.
pub const DEFAULT_MAX_ATTEMPTS: usize = 5;

/// Fixed pause between two attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Bounded retry with a fixed delay between attempts.
///
/// There is no jitter and no backoff: a failing operation costs exactly
/// `(max_attempts - 1) * delay` of waiting before it is given up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY)
    }
}

impl RetryPolicy {
    pub const fn new(max_attempts: usize, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Run `operation` until it succeeds or the attempts are used up.
    ///
    /// Every failure is retried, whatever its kind. After the last attempt the
    /// failure is logged at error level and reported as
    /// [`StorageError::RetriesExhausted`], which callers handle as a best-effort
    /// degradation rather than a fatal fault.
    pub async fn execute<F, Fut, T, E>(
        &self,
        operation_name: &str,
        operation: F,
    ) -> StorageResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        retry_with_policy(self, operation_name, operation).await
    }
}

/// Static retry function for retrying operations
pub async fn retry_with_policy<F, Fut, T, E>(
    policy: &RetryPolicy,
    operation_name: &str,
    mut operation: F,
) -> StorageResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let attempts = policy.max_attempts.max(1);
    let mut retries_left = attempts;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                retries_left -= 1;
                if retries_left == 0 {
                    error!(
                        "Too many failures in {}, giving up after attempts={}: {}",
                        operation_name, attempts, e
                    );
                    return Err(StorageError::RetriesExhausted {
                        operation: operation_name.to_string(),
                        attempts,
                        last_error: e.to_string(),
                    });
                }

                warn!(
                    "Error in {}, retries_left={}: {}",
                    operation_name, retries_left, e
                );
                tokio::time::sleep(policy.delay).await;
            }
        }
    }
}
