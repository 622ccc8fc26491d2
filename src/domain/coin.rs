//! Aggregated Coin
//!
//! The persisted unit: a flattened merge of a listing record and its detail
//! record plus the time it was ingested. JSON keys follow the document format
//! consumers already read (mixed camelCase / snake_case).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::detail::DetailRecord;
use super::listing::ListingRecord;

/// Number of random bytes behind a generated coin id
const COIN_ID_BYTES: usize = 8;

/// Current price plus the endpoint that refreshes it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LivePrice {
    pub value: f64,
    pub url: String,
}

/// One merged, fully defaulted coin entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedCoin {
    pub name: String,
    pub symbol: String,
    pub price: f64,
    #[serde(rename = "livePrice")]
    pub live_price: LivePrice,
    pub rank: u32,
    pub cap: f64,
    /// Ingestion time, milliseconds since the Unix epoch
    #[serde(rename = "addedDate")]
    pub added_date: String,
    #[serde(rename = "coinMarketCap")]
    pub coin_market_cap: bool,
    pub coingecko: bool,
    pub chain: String,
    #[serde(rename = "launchDate")]
    pub launch_date: String,
    pub token: bool,
    pub description: String,
    #[serde(rename = "explorerLink")]
    pub explorer_link: String,
    pub address: BTreeMap<String, String>,
    pub website: String,
    pub reddit: String,
    pub telegram: String,
    pub twitter: String,
    pub insta: String,
    pub youtube: String,
    pub discord: String,
    #[serde(rename = "coinLogo")]
    pub coin_logo: String,
    pub coingecko_rank: u32,
    pub coingecko_score: f64,
    pub developer_score: f64,
    pub community_score: f64,
    pub liquidity_score: f64,
    pub public_interest_score: f64,
    pub total_volume: f64,
    pub high_24h: f64,
    pub low_24h: f64,
    pub price_change_24h: f64,
    pub price_change_percentage_24h: f64,
    pub market_cap_change_24h: f64,
    pub market_cap_change_percentage_24h: f64,
    pub circulating_supply: f64,
    pub total_supply: f64,
    pub max_supply: f64,
    pub last_updated: String,
    pub platforms: BTreeMap<String, String>,
}

impl AggregatedCoin {
    /// Merge a listing and its detail into one coin entry.
    ///
    /// `live_price_url` is the simple-price endpoint for this asset; `added_at`
    /// becomes the `addedDate` field.
    pub fn merge(
        listing: &ListingRecord,
        detail: DetailRecord,
        live_price_url: String,
        added_at: DateTime<Utc>,
    ) -> Self {
        let market = detail.market_data;

        Self {
            name: listing.name.clone(),
            symbol: listing.symbol.clone(),
            price: market.current_price,
            live_price: LivePrice {
                value: market.current_price,
                url: live_price_url,
            },
            rank: detail.market_cap_rank,
            cap: market.market_cap,
            added_date: added_at.timestamp_millis().to_string(),
            coin_market_cap: true,
            coingecko: true,
            chain: detail.asset_platform_id,
            launch_date: detail.genesis_date,
            token: true,
            description: detail.description,
            explorer_link: detail.blockchain_site,
            address: detail.platforms.clone(),
            website: detail.homepage,
            reddit: detail.reddit,
            telegram: detail.telegram,
            twitter: detail.twitter,
            insta: detail.insta,
            youtube: detail.youtube,
            discord: detail.discord,
            coin_logo: detail.image,
            coingecko_rank: detail.coingecko_rank,
            coingecko_score: detail.coingecko_score,
            developer_score: detail.developer_score,
            community_score: detail.community_score,
            liquidity_score: detail.liquidity_score,
            public_interest_score: detail.public_interest_score,
            total_volume: market.total_volume,
            high_24h: market.high_24h,
            low_24h: market.low_24h,
            price_change_24h: market.price_change_24h,
            price_change_percentage_24h: market.price_change_percentage_24h,
            market_cap_change_24h: market.market_cap_change_24h,
            market_cap_change_percentage_24h: market.market_cap_change_percentage_24h,
            circulating_supply: market.circulating_supply,
            total_supply: market.total_supply,
            max_supply: market.max_supply,
            last_updated: detail.last_updated,
            platforms: detail.platforms,
        }
    }
}

/// Generate a fresh random document key (16 lowercase hex chars).
///
/// Keys are not derived from the upstream id and collisions are not checked.
pub fn generate_coin_id() -> String {
    hex::encode(rand::random::<[u8; COIN_ID_BYTES]>())
}
