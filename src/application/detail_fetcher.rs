//! Detail Fetcher
//!
//! Per-coin metadata lookup that never fails from the caller's side: rate
//! limits are retried, everything else (including exhausted retries) is
//! logged and reported as `DetailOutcome::Fallback`, which stands for
//! `DetailRecord::default()`.

use crate::domain::DetailRecord;
use crate::ports::{MarketDataError, MarketDataPort};
use super::retry::{RetryDisposition, RetryError, RetryPolicy};

/// Result of one detail lookup
#[derive(Debug, Clone, PartialEq)]
pub enum DetailOutcome {
    /// Upstream answered; the record may still be mostly defaults
    Fetched(DetailRecord),
    /// Lookup failed; callers use `DetailRecord::default()`
    Fallback,
}

impl DetailOutcome {
    pub fn is_fallback(&self) -> bool {
        matches!(self, DetailOutcome::Fallback)
    }

    pub fn into_detail(self) -> DetailRecord {
        match self {
            DetailOutcome::Fetched(detail) => detail,
            DetailOutcome::Fallback => DetailRecord::default(),
        }
    }
}

pub struct DetailFetcher<'a, M: MarketDataPort + ?Sized> {
    market: &'a M,
    retry: RetryPolicy,
}

impl<'a, M: MarketDataPort + ?Sized> DetailFetcher<'a, M> {
    pub fn new(market: &'a M, retry: RetryPolicy) -> Self {
        Self { market, retry }
    }

    pub async fn fetch(&self, coin_id: &str) -> DetailOutcome {
        let result = self
            .retry
            .run(
                |_| self.market.fetch_coin_detail(coin_id),
                |err: &MarketDataError| {
                    if err.is_rate_limited() {
                        RetryDisposition::Retry
                    } else {
                        RetryDisposition::Abort
                    }
                },
                |_, delay, _| {
                    tracing::warn!(
                        "Rate limited when fetching details for coin {}. Retrying in {} seconds...",
                        coin_id,
                        delay.as_secs()
                    );
                },
            )
            .await;

        match result {
            Ok(detail) => DetailOutcome::Fetched(detail),
            Err(RetryError::Exhausted { .. }) => {
                tracing::error!("Max retries reached for coin {}", coin_id);
                DetailOutcome::Fallback
            }
            Err(RetryError::Aborted(e)) => {
                tracing::error!("Error fetching details for coin {}: {}", coin_id, e);
                DetailOutcome::Fallback
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::retry::DETAIL_RETRY;
    use crate::ports::mocks::MockMarketData;
    use std::time::Duration;
    use tokio::time::Instant;

    fn ethereum() -> DetailRecord {
        DetailRecord {
            homepage: "https://www.ethereum.org/".to_string(),
            market_cap_rank: 2,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_success_passes_through() {
        let mock = MockMarketData::new().with_detail("ethereum", ethereum());
        let outcome = DetailFetcher::new(&mock, DETAIL_RETRY).fetch("ethereum").await;
        assert_eq!(outcome, DetailOutcome::Fetched(ethereum()));
    }

    #[tokio::test]
    async fn test_empty_upstream_record_is_not_a_fallback() {
        let mock = MockMarketData::new().with_detail("obscure", DetailRecord::default());
        let outcome = DetailFetcher::new(&mock, DETAIL_RETRY).fetch("obscure").await;

        assert!(!outcome.is_fallback());
        assert!(outcome.into_detail().is_default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_then_success() {
        let mock = MockMarketData::new()
            .with_detail("ethereum", ethereum())
            .with_detail_script(
                "ethereum",
                vec![
                    Err(MarketDataError::RateLimited),
                    Err(MarketDataError::RateLimited),
                    Err(MarketDataError::RateLimited),
                ],
            );
        let started = Instant::now();

        let outcome = DetailFetcher::new(&mock, DETAIL_RETRY).fetch("ethereum").await;

        assert_eq!(outcome.into_detail(), ethereum());
        assert_eq!(mock.detail_calls("ethereum"), 4);
        assert_eq!(started.elapsed(), Duration::from_secs(2 + 4 + 8));
    }

    #[tokio::test]
    async fn test_other_failure_degrades_to_default() {
        let mock = MockMarketData::new();
        let outcome = DetailFetcher::new(&mock, DETAIL_RETRY).fetch("delisted").await;

        assert_eq!(outcome, DetailOutcome::Fallback);
        assert_eq!(mock.detail_calls("delisted"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_degrade_to_default() {
        let mock = MockMarketData::new()
            .with_detail("ethereum", ethereum())
            .with_detail_script("ethereum", vec![Err(MarketDataError::RateLimited); 5]);

        let outcome = DetailFetcher::new(&mock, DETAIL_RETRY).fetch("ethereum").await;

        assert!(outcome.is_fallback());
        assert_eq!(mock.detail_calls("ethereum"), 5);
    }

    #[tokio::test]
    async fn test_timeout_degrades_to_default() {
        let mock = MockMarketData::new()
            .with_detail_script("ethereum", vec![Err(MarketDataError::Timeout("30s".into()))]);

        let outcome = DetailFetcher::new(&mock, DETAIL_RETRY).fetch("ethereum").await;
        assert!(outcome.is_fallback());
        assert!(outcome.into_detail().is_default());
    }
}
