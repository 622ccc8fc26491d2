//! Listing Fetcher
//!
//! Walks the market listing page by page and concatenates the results in
//! page order. Any failure that survives the retry policy is fatal.

use std::time::Duration;

use crate::domain::ListingRecord;
use crate::ports::{ListingQuery, MarketDataError, MarketDataPort};
use super::retry::{RetryDisposition, RetryError, RetryPolicy};

/// Pagination parameters for one run
#[derive(Debug, Clone, PartialEq)]
pub struct PaginationSettings {
    pub vs_currency: String,
    pub per_page: u32,
    /// Highest page number requested
    pub max_pages: u32,
    /// Pause after a successful page when another page follows
    pub page_pause: Duration,
}

pub struct ListingFetcher<'a, M: MarketDataPort + ?Sized> {
    market: &'a M,
    settings: &'a PaginationSettings,
    retry: RetryPolicy,
}

impl<'a, M: MarketDataPort + ?Sized> ListingFetcher<'a, M> {
    pub fn new(market: &'a M, settings: &'a PaginationSettings, retry: RetryPolicy) -> Self {
        Self {
            market,
            settings,
            retry,
        }
    }

    /// Fetch pages 1..=max_pages, stopping early at the first empty page
    pub async fn fetch_all(&self) -> Result<Vec<ListingRecord>, RetryError<MarketDataError>> {
        let mut all = Vec::new();
        let mut page = 1;

        while page <= self.settings.max_pages {
            tracing::info!("Fetching page {}...", page);
            let records = self.fetch_page(page).await?;

            if records.is_empty() {
                tracing::info!("No more data available. Stopping at page {}.", page - 1);
                break;
            }

            tracing::debug!("Page {} returned {} records", page, records.len());
            all.extend(records);
            page += 1;

            if page <= self.settings.max_pages {
                tracing::info!(
                    "Waiting {:?} before next page request...",
                    self.settings.page_pause
                );
                tokio::time::sleep(self.settings.page_pause).await;
            }
        }

        Ok(all)
    }

    async fn fetch_page(
        &self,
        page: u32,
    ) -> Result<Vec<ListingRecord>, RetryError<MarketDataError>> {
        let query = ListingQuery::page(&self.settings.vs_currency, self.settings.per_page, page);

        self.retry
            .run(
                |_| self.market.fetch_listing_page(&query),
                |err: &MarketDataError| {
                    if err.is_rate_limited() {
                        RetryDisposition::Retry
                    } else {
                        RetryDisposition::Abort
                    }
                },
                |attempt, delay, _| {
                    tracing::warn!(
                        "Rate limited. Retrying in {} seconds... (attempt {}/{})",
                        delay.as_secs(),
                        attempt,
                        self.retry.max_attempts
                    );
                },
            )
            .await
    }
}
