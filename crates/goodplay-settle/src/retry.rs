//! Retry with exponential backoff for chain reads.
//!
//! Applied only to idempotent reads (block number, log scans, balance
//! queries). Submissions are deliberately outside retry scope: re-sending a
//! signed payload after a timeout risks a double transfer.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::RetryConfig;
use crate::error::{SettleError, SettleResult};

/// Retry policy with exponential backoff and jitter.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl RetryPolicy {
    /// Create from retry configuration.
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: config.base_delay,
            max_delay: config.max_delay,
        }
    }

    /// Backoff before the given attempt (0-indexed; attempt 0 has none).
    ///
    /// Doubles per attempt, capped at `max_delay`, with +-25% jitter so
    /// concurrent reconcilers don't hammer the endpoint in lockstep.
    pub fn backoff(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let doubled = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(attempt - 1));
        let capped = doubled.min(self.max_delay);

        let quarter = capped.as_millis() as u64 / 4;
        if quarter == 0 {
            return capped;
        }
        let jitter = rand::random::<u64>() % (quarter * 2);
        Duration::from_millis((capped.as_millis() as u64 - quarter).saturating_add(jitter))
    }

    /// Run a read operation, retrying on retryable errors only.
    pub async fn read<F, Fut, T>(&self, mut operation: F) -> SettleResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = SettleResult<T>>,
    {
        let mut last_error = None;
        for attempt in 0..self.max_attempts {
            let delay = self.backoff(attempt);
            if !delay.is_zero() {
                debug!(attempt, ?delay, "retrying chain read after backoff");
                sleep(delay).await;
            }

            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt + 1 < self.max_attempts => {
                    warn!(
                        attempt = attempt + 1,
                        max_attempts = self.max_attempts,
                        error = %e,
                        "retryable chain read failure"
                    );
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }
        Err(last_error.unwrap_or_else(|| SettleError::timeout("retry attempts exhausted")))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(&RetryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast_policy(attempts: u32) -> RetryPolicy {
        RetryPolicy::new(&RetryConfig {
            max_attempts: attempts,
            base_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(40),
        })
    }

    #[test]
    fn test_backoff_zero_for_first_attempt() {
        assert_eq!(fast_policy(3).backoff(0), Duration::ZERO);
    }

    #[test]
    fn test_backoff_within_jitter_band() {
        let policy = RetryPolicy::new(&RetryConfig {
            max_attempts: 5,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
        });

        // Attempt 2 doubles once: 200ms +- 25%.
        let d = policy.backoff(2);
        assert!(d >= Duration::from_millis(150) && d <= Duration::from_millis(250), "{:?}", d);
    }

    #[test]
    fn test_backoff_caps_at_max() {
        let policy = RetryPolicy::new(&RetryConfig {
            max_attempts: 10,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(400),
        });

        // Far past the cap: 400ms +- 25%.
        let d = policy.backoff(9);
        assert!(d >= Duration::from_millis(300) && d <= Duration::from_millis(500), "{:?}", d);
    }

    #[tokio::test]
    async fn test_read_succeeds_first_try() {
        let calls = Arc::new(AtomicU32::new(0));
        let result = fast_policy(3)
            .read(|| {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, SettleError>(99u64)
                }
            })
            .await;
        assert_eq!(result.unwrap(), 99);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_read_retries_chain_unavailable() {
        let calls = Arc::new(AtomicU32::new(0));
        let result = fast_policy(3)
            .read(|| {
                let calls = Arc::clone(&calls);
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(SettleError::chain_unavailable("connection reset"))
                    } else {
                        Ok(7u64)
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_read_gives_up_on_non_retryable() {
        let calls = Arc::new(AtomicU32::new(0));
        let result: SettleResult<u64> = fast_policy(5)
            .read(|| {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(SettleError::reverted("execution reverted"))
                }
            })
            .await;
        assert!(matches!(result, Err(SettleError::Reverted(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_read_exhausts_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let result: SettleResult<u64> = fast_policy(3)
            .read(|| {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(SettleError::chain_unavailable("still down"))
                }
            })
            .await;
        assert!(matches!(result, Err(SettleError::ChainUnavailable(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
