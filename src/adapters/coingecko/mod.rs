//! CoinGecko Adapter
//!
//! Implements `MarketDataPort` against the public CoinGecko v3 REST API.
//!
//! # Example
//!
//! ```rust,ignore
//! use gecko_harvest::adapters::coingecko::CoinGeckoClient;
//! use gecko_harvest::ports::{ListingQuery, MarketDataPort};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = CoinGeckoClient::new()?;
//!     let top = client.fetch_listing_page(&ListingQuery::page("usd", 10, 1)).await?;
//!     let detail = client.fetch_coin_detail(&top[0].id).await?;
//!     println!("{}: {}", top[0].name, detail.homepage);
//!     Ok(())
//! }
//! ```

mod client;
mod types;

pub use client::{CoinGeckoClient, CoinGeckoConfig, DEFAULT_BASE_URL};
pub use types::{RawCoinDetail, RawLinks, RawMarketData};
