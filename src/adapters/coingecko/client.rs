//! CoinGecko API Client
//!
//! HTTP client for the public CoinGecko v3 API. Only two read-only endpoints
//! are used: `/coins/markets` (paginated listing) and `/coins/{id}` (detail).
//! Retries live in the application layer; this client maps one HTTP exchange
//! to one result, with HTTP 429 surfaced as `MarketDataError::RateLimited`.

use std::time::Duration;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;

use crate::domain::{DetailRecord, ListingRecord};
use crate::ports::{ListingQuery, MarketDataError, MarketDataPort};
use super::types::RawCoinDetail;

/// Public CoinGecko v3 API
pub const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// Configuration for the CoinGeckoClient
#[derive(Debug, Clone)]
pub struct CoinGeckoConfig {
    /// API base URL (no trailing slash)
    pub base_url: String,
    /// Quote currency for prices, market caps and volumes
    pub vs_currency: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for CoinGeckoConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            vs_currency: "usd".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Client for the CoinGecko market endpoints
#[derive(Debug, Clone)]
pub struct CoinGeckoClient {
    config: CoinGeckoConfig,
    http: Client,
}

impl CoinGeckoClient {
    /// Create a new client with default configuration
    pub fn new() -> Result<Self, MarketDataError> {
        Self::with_config(CoinGeckoConfig::default())
    }

    /// Create a new client with custom configuration
    pub fn with_config(mut config: CoinGeckoConfig) -> Result<Self, MarketDataError> {
        config.base_url = config.base_url.trim_end_matches('/').to_string();

        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MarketDataError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, http })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn markets_url(&self) -> String {
        format!("{}/coins/markets", self.config.base_url)
    }

    fn coin_url(&self, coin_id: &str) -> String {
        format!("{}/coins/{}", self.config.base_url, coin_id)
    }

    /// Send a request and decode the JSON body
    async fn get_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, MarketDataError> {
        let response = request.send().await.map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, body));
        }

        let bytes = response.bytes().await.map_err(map_transport_error)?;
        serde_json::from_slice(&bytes)
            .map_err(|e| MarketDataError::Parse(format!("Failed to parse JSON: {}", e)))
    }
}

/// Map a non-success status to the port error; 429 is the rate-limit signal
pub(crate) fn classify_status(status: StatusCode, body: String) -> MarketDataError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        MarketDataError::RateLimited
    } else {
        let message: String = body.chars().take(200).collect();
        MarketDataError::Status(status.as_u16(), message)
    }
}

fn map_transport_error(e: reqwest::Error) -> MarketDataError {
    if e.is_timeout() {
        MarketDataError::Timeout(e.to_string())
    } else {
        MarketDataError::Http(e.to_string())
    }
}

#[async_trait]
impl MarketDataPort for CoinGeckoClient {
    async fn fetch_listing_page(
        &self,
        query: &ListingQuery,
    ) -> Result<Vec<ListingRecord>, MarketDataError> {
        let url = self.markets_url();
        tracing::debug!("GET {} page={} per_page={}", url, query.page, query.per_page);

        let request = self.http.get(&url).query(&[
            ("vs_currency", query.vs_currency.clone()),
            ("order", query.order.as_str().to_string()),
            ("per_page", query.per_page.to_string()),
            ("page", query.page.to_string()),
            ("sparkline", query.sparkline.to_string()),
        ]);

        self.get_json(request).await
    }

    async fn fetch_coin_detail(&self, coin_id: &str) -> Result<DetailRecord, MarketDataError> {
        let url = self.coin_url(coin_id);
        tracing::debug!("GET {}", url);

        let raw: RawCoinDetail = self.get_json(self.http.get(&url)).await?;
        Ok(raw.into_detail(&self.config.vs_currency))
    }

    fn live_price_url(&self, coin_id: &str) -> String {
        format!(
            "{}/simple/price?ids={}&vs_currencies={}",
            self.config.base_url, coin_id, self.config.vs_currency
        )
    }
}
