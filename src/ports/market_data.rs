//! Market Data Port
//!
//! Read-only access to the two upstream endpoints: the paginated market
//! listing and the per-asset detail lookup.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{DetailRecord, ListingRecord};

/// Market data error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketDataError {
    #[error("Rate limited by upstream API (HTTP 429)")]
    RateLimited,

    #[error("Unexpected HTTP status {0}: {1}")]
    Status(u16, String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Failed to parse response: {0}")]
    Parse(String),
}

impl MarketDataError {
    /// True for the upstream's "slow down" signal, the only retryable condition
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, MarketDataError::RateLimited)
    }
}

/// Sort order for the market listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingOrder {
    MarketCapDesc,
}

impl ListingOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingOrder::MarketCapDesc => "market_cap_desc",
        }
    }
}

/// Parameters for one listing page request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingQuery {
    pub vs_currency: String,
    pub order: ListingOrder,
    pub per_page: u32,
    /// 1-based page number
    pub page: u32,
    pub sparkline: bool,
}

impl ListingQuery {
    /// Query for one page of top assets by market cap, sparkline disabled
    pub fn page(vs_currency: impl Into<String>, per_page: u32, page: u32) -> Self {
        Self {
            vs_currency: vs_currency.into(),
            order: ListingOrder::MarketCapDesc,
            per_page,
            page,
            sparkline: false,
        }
    }
}

/// Market data port trait
#[async_trait]
pub trait MarketDataPort: Send + Sync {
    /// Fetch one page of the market listing. An empty vec means no more pages.
    async fn fetch_listing_page(
        &self,
        query: &ListingQuery,
    ) -> Result<Vec<ListingRecord>, MarketDataError>;

    /// Fetch extended metadata for one asset, defaults already applied
    async fn fetch_coin_detail(&self, coin_id: &str) -> Result<DetailRecord, MarketDataError>;

    /// URL of the simple-price endpoint for this asset
    fn live_price_url(&self, coin_id: &str) -> String;
}
