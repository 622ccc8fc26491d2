//! Retry Policy
//!
//! One parameterized exponential backoff used by both fetch sites. The caller
//! classifies each failure: recoverable failures wait `base_delay *
//! multiplier^n` and try again, anything else is returned immediately.

use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Listing fetch: 5 attempts, 2s base delay, x4 growth
pub const LISTING_RETRY: RetryPolicy = RetryPolicy::new(5, Duration::from_millis(2_000), 4);

/// Detail fetch: 5 attempts, 2s base delay, x2 growth
pub const DETAIL_RETRY: RetryPolicy = RetryPolicy::new(5, Duration::from_millis(2_000), 2);

/// What to do with a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDisposition {
    Retry,
    Abort,
}

#[derive(Debug, Error, PartialEq)]
pub enum RetryError<E> {
    #[error("retries exhausted after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: E },

    #[error("{0}")]
    Aborted(E),
}

impl<E> RetryError<E> {
    /// The underlying error of the last attempt
    pub fn into_inner(self) -> E {
        match self {
            RetryError::Exhausted { last, .. } => last,
            RetryError::Aborted(e) => e,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first
    pub max_attempts: u32,
    /// Wait before the first retry
    pub base_delay: Duration,
    /// Growth factor applied to each subsequent wait
    pub multiplier: u32,
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, base_delay: Duration, multiplier: u32) -> Self {
        Self {
            max_attempts,
            base_delay,
            multiplier,
        }
    }

    /// Wait before retry number `retry` (0-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = self.multiplier.saturating_pow(retry);
        self.base_delay.saturating_mul(factor)
    }

    /// Run `operation` until it succeeds, is aborted by `classify`, or the
    /// attempt budget is spent. `on_retry(attempt, delay, &error)` fires
    /// before each wait. No wait follows the final attempt.
    pub async fn run<T, E, F, Fut, C, L>(
        &self,
        mut operation: F,
        mut classify: C,
        mut on_retry: L,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        C: FnMut(&E) -> RetryDisposition,
        L: FnMut(u32, Duration, &E),
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;

            let err = match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if classify(&err) == RetryDisposition::Abort {
                return Err(RetryError::Aborted(err));
            }

            if attempt >= max_attempts {
                return Err(RetryError::Exhausted {
                    attempts: attempt,
                    last: err,
                });
            }

            let delay = self.delay_for(attempt - 1);
            on_retry(attempt, delay, &err);
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use tokio::time::Instant;

    #[derive(Debug, Clone, PartialEq)]
    enum FakeError {
        Busy,
        Broken,
    }

    fn classify(err: &FakeError) -> RetryDisposition {
        match err {
            FakeError::Busy => RetryDisposition::Retry,
            FakeError::Broken => RetryDisposition::Abort,
        }
    }

    /// Fails with `Busy` for the first `busy` attempts, then succeeds
    async fn busy_then_ok(
        policy: RetryPolicy,
        busy: u32,
    ) -> (Result<u32, RetryError<FakeError>>, Vec<Duration>) {
        let waits = RefCell::new(Vec::new());
        let result = policy
            .run(
                |attempt| async move {
                    if attempt <= busy {
                        Err(FakeError::Busy)
                    } else {
                        Ok(attempt)
                    }
                },
                classify,
                |_, delay, _| waits.borrow_mut().push(delay),
            )
            .await;
        (result, waits.into_inner())
    }

    #[test]
    fn test_delay_schedule() {
        assert_eq!(LISTING_RETRY.delay_for(0), Duration::from_secs(2));
        assert_eq!(LISTING_RETRY.delay_for(1), Duration::from_secs(8));
        assert_eq!(LISTING_RETRY.delay_for(2), Duration::from_secs(32));
        assert_eq!(DETAIL_RETRY.delay_for(2), Duration::from_secs(8));
    }

    #[test]
    fn test_delay_saturates() {
        let policy = RetryPolicy::new(100, Duration::from_secs(1), 10);
        assert_eq!(policy.delay_for(40), Duration::from_secs(u32::MAX as u64));
    }

    #[tokio::test(start_paused = true)]
    async fn test_listing_backoff_grows_by_four() {
        let started = Instant::now();
        let (result, waits) = busy_then_ok(LISTING_RETRY, 3).await;

        assert_eq!(result, Ok(4));
        assert_eq!(
            waits,
            vec![Duration::from_secs(2), Duration::from_secs(8), Duration::from_secs(32)]
        );
        assert_eq!(started.elapsed(), Duration::from_secs(42));
    }

    #[tokio::test(start_paused = true)]
    async fn test_detail_backoff_grows_by_two() {
        let (result, waits) = busy_then_ok(DETAIL_RETRY, 4).await;

        assert_eq!(result, Ok(5));
        for pair in waits.windows(2) {
            assert_eq!(pair[1], pair[0] * 2);
        }
        assert_eq!(waits.len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_after_max_attempts() {
        let started = Instant::now();
        let (result, waits) = busy_then_ok(LISTING_RETRY, u32::MAX).await;

        assert_eq!(
            result,
            Err(RetryError::Exhausted {
                attempts: 5,
                last: FakeError::Busy
            })
        );
        assert_eq!(waits.len(), 4);
        // 2 + 8 + 32 + 128, no wait after the last attempt
        assert_eq!(started.elapsed(), Duration::from_secs(170));
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_recoverable_aborts_immediately() {
        let calls = RefCell::new(0);
        let result: Result<(), _> = DETAIL_RETRY
            .run(
                |_| {
                    *calls.borrow_mut() += 1;
                    async { Err(FakeError::Broken) }
                },
                classify,
                |_, _, _| panic!("must not retry"),
            )
            .await;

        assert_eq!(result, Err(RetryError::Aborted(FakeError::Broken)));
        assert_eq!(*calls.borrow(), 1);
    }

    #[tokio::test]
    async fn test_zero_attempts_still_runs_once() {
        let policy = RetryPolicy::new(0, Duration::ZERO, 2);
        let (result, waits) = busy_then_ok(policy, 0).await;
        assert_eq!(result, Ok(1));
        assert!(waits.is_empty());
    }

    #[test]
    fn test_into_inner() {
        let err: RetryError<FakeError> = RetryError::Exhausted {
            attempts: 5,
            last: FakeError::Busy,
        };
        assert_eq!(err.into_inner(), FakeError::Busy);
    }
}
