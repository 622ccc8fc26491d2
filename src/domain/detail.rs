//! Detail Records
//!
//! Extended per-asset metadata. Every field carries a concrete value: a lookup
//! that fails produces `DetailRecord::default()` instead of an error, so the
//! aggregation never branches on a missing detail.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Placeholder used when the upstream description is absent
pub const DEFAULT_DESCRIPTION: &str = "No description available";

/// Market statistics nested inside a detail record (quote-currency denominated)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketStats {
    pub current_price: f64,
    pub market_cap: f64,
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
}

/// Extended metadata for one asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailRecord {
    pub reddit: String,
    pub telegram: String,
    pub twitter: String,
    pub insta: String,
    pub youtube: String,
    pub discord: String,
    pub description: String,
    pub homepage: String,
    pub blockchain_site: String,
    pub image: String,
    pub market_cap_rank: u32,
    pub coingecko_rank: u32,
    pub coingecko_score: f64,
    pub developer_score: f64,
    pub community_score: f64,
    pub liquidity_score: f64,
    pub public_interest_score: f64,
    pub market_data: MarketStats,
    pub last_updated: String,
    pub genesis_date: String,
    pub ico_data: serde_json::Map<String, serde_json::Value>,
    pub asset_platform_id: String,
    /// Platform id -> contract address; entries with empty addresses are dropped
    pub platforms: BTreeMap<String, String>,
}

impl Default for DetailRecord {
    fn default() -> Self {
        Self {
            reddit: String::new(),
            telegram: String::new(),
            twitter: String::new(),
            insta: String::new(),
            youtube: String::new(),
            discord: String::new(),
            description: DEFAULT_DESCRIPTION.to_string(),
            homepage: String::new(),
            blockchain_site: String::new(),
            image: String::new(),
            market_cap_rank: 0,
            coingecko_rank: 0,
            coingecko_score: 0.0,
            developer_score: 0.0,
            community_score: 0.0,
            liquidity_score: 0.0,
            public_interest_score: 0.0,
            market_data: MarketStats::default(),
            last_updated: String::new(),
            genesis_date: String::new(),
            ico_data: serde_json::Map::new(),
            asset_platform_id: String::new(),
            platforms: BTreeMap::new(),
        }
    }
}

impl DetailRecord {
    /// True when every field still holds its default value
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Keep only platform entries that carry a non-empty address
pub fn valid_platform_addresses<I>(platforms: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = (String, Option<String>)>,
{
    platforms
        .into_iter()
        .filter_map(|(platform, address)| match address {
            Some(address) if !address.is_empty() => Some((platform, address)),
            _ => None,
        })
        .collect()
}
