//! Fixed-backoff retry around a single probe.

use crate::utils::smtp::SmtpVerificationResult;
use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, first try included.
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            backoff: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Runs `attempt` until it is conclusive, not retryable, or out of attempts.
    ///
    /// Returns the last result and the number of attempts made.
    pub async fn run<F, Fut>(&self, label: &str, mut attempt: F) -> (SmtpVerificationResult, u32)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = SmtpVerificationResult>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut made = 0;
        loop {
            made += 1;
            let result = attempt().await;
            if result.exists.is_some() || !result.should_retry || made >= max_attempts {
                return (result, made);
            }
            tracing::debug!(target: "verification",
                "{} inconclusive on attempt {}/{} ({}), retrying in {:?}",
                label, made, max_attempts, result.message, self.backoff
            );
            tokio::time::sleep(self.backoff).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_retries_transient_once() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::default();
        let (result, attempts) = policy
            .run("t", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                SmtpVerificationResult::inconclusive_retry("greylisted")
            })
            .await;
        assert_eq!(attempts, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(result.exists, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_attempt_can_succeed() {
        let calls = AtomicU32::new(0);
        let (result, attempts) = RetryPolicy::default()
            .run("t", || async {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    SmtpVerificationResult::inconclusive_retry("timeout")
                } else {
                    SmtpVerificationResult::conclusive(true, "250 ok")
                }
            })
            .await;
        assert_eq!(attempts, 2);
        assert!(result.is_accepted());
    }

    #[tokio::test]
    async fn test_conclusive_and_non_retryable_stop_immediately() {
        let (_, attempts) = RetryPolicy::default()
            .run("t", || async { SmtpVerificationResult::conclusive(false, "550") })
            .await;
        assert_eq!(attempts, 1);

        let (_, attempts) = RetryPolicy::default()
            .run("t", || async { SmtpVerificationResult::inconclusive_no_retry("weird") })
            .await;
        assert_eq!(attempts, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_is_applied() {
        let start = tokio::time::Instant::now();
        let policy = RetryPolicy::new(3, Duration::from_millis(500));
        let (_, attempts) = policy
            .run("t", || async { SmtpVerificationResult::inconclusive_retry("4xx") })
            .await;
        assert_eq!(attempts, 3);
        assert!(start.elapsed() >= Duration::from_millis(1000));
    }
}
