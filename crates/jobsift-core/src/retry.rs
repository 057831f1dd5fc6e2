//! Retry-with-backoff decoration around ledger I/O.

use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

use crate::error::AppError;
use crate::models::{CompanyStatus, Job};
use crate::traits::LedgerStore;

/// Exponential backoff policy: `base_delay * 2^(attempt-1)`, capped.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Delay before the retry following `attempt` (1-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        let delay = self.base_delay.saturating_mul(1u32 << exp);
        delay.min(self.max_delay)
    }
}

/// [`LedgerStore`] decorator retrying transient failures with exponential
/// backoff. Permanent failures (auth, 4xx) propagate immediately.
#[derive(Clone)]
pub struct RetryingLedger<L> {
    inner: L,
    policy: RetryPolicy,
}

impl<L: LedgerStore> RetryingLedger<L> {
    pub fn new(inner: L, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    async fn retry<T, F, Fut>(&self, op_name: &str, mut op: F) -> Result<T, AppError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.policy.max_attempts => {
                    let delay = self.policy.delay_for_attempt(attempt);
                    tracing::warn!(
                        op = op_name,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Ledger call failed; retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl<L: LedgerStore> LedgerStore for RetryingLedger<L> {
    async fn get_existing_ids(&self) -> Result<HashSet<String>, AppError> {
        self.retry("get_existing_ids", || self.inner.get_existing_ids())
            .await
    }

    async fn append_jobs(&self, jobs: &[Job]) -> Result<usize, AppError> {
        self.retry("append_jobs", || self.inner.append_jobs(jobs))
            .await
    }

    async fn mark_last_seen(&self, ids: &[String]) -> Result<(), AppError> {
        self.retry("mark_last_seen", || self.inner.mark_last_seen(ids))
            .await
    }

    async fn set_company_status(&self, name: &str, status: CompanyStatus) -> Result<(), AppError> {
        self.retry("set_company_status", || {
            self.inner.set_company_status(name, status)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::MockLedger;

    #[test]
    fn test_backoff_schedule_is_capped() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(500));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_secs(1));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_secs(2));
        assert_eq!(policy.delay_for_attempt(10), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn transient_failure_is_retried_until_success() {
        let ledger = MockLedger::empty();
        for _ in 0..2 {
            ledger.push_append_error(AppError::LedgerError {
                message: "503".into(),
                retryable: true,
            });
        }
        let policy = RetryPolicy {
            base_delay: Duration::ZERO,
            ..RetryPolicy::default()
        };
        let retrying = RetryingLedger::new(ledger.clone(), policy);

        let written = retrying.append_jobs(&[]).await.unwrap();
        assert_eq!(written, 0);
        assert_eq!(ledger.append_calls(), 3);
    }

    #[tokio::test]
    async fn permanent_failure_is_not_retried() {
        let ledger = MockLedger::empty();
        ledger.push_append_error(AppError::LedgerError {
            message: "invalid credentials".into(),
            retryable: false,
        });
        let policy = RetryPolicy {
            base_delay: Duration::ZERO,
            ..RetryPolicy::default()
        };
        let retrying = RetryingLedger::new(ledger.clone(), policy);

        let err = retrying.append_jobs(&[]).await.unwrap_err();
        assert!(matches!(err, AppError::LedgerError { retryable: false, .. }));
        assert_eq!(ledger.append_calls(), 1);
    }

    #[tokio::test]
    async fn attempts_are_bounded() {
        let ledger = MockLedger::empty();
        for _ in 0..10 {
            ledger.push_append_error(AppError::LedgerError {
                message: "503".into(),
                retryable: true,
            });
        }
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        };
        let retrying = RetryingLedger::new(ledger.clone(), policy);

        assert!(retrying.append_jobs(&[]).await.is_err());
        assert_eq!(ledger.append_calls(), 3);
    }
}
