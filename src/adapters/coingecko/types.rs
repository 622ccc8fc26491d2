//! CoinGecko Response Types
//!
//! Raw shapes of the `/coins/{id}` response. Every field is optional because
//! the API omits or nulls fields freely; `into_detail` applies the defaults.

use serde::Deserialize;
use std::collections::HashMap;

use crate::domain::detail::{valid_platform_addresses, DetailRecord, MarketStats, DEFAULT_DESCRIPTION};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawLinks {
    pub homepage: Option<Vec<Option<String>>>,
    pub blockchain_site: Option<Vec<Option<String>>>,
    pub chat_url: Option<Vec<Option<String>>>,
    pub subreddit_url: Option<String>,
    pub telegram_channel_identifier: Option<String>,
    pub twitter_screen_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawImage {
    pub large: Option<String>,
}

/// Per-currency value map, e.g. `{"usd": 67000.0, "eur": 61000.0}`
pub type CurrencyMap = HashMap<String, Option<f64>>;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawMarketData {
    pub current_price: Option<CurrencyMap>,
    pub market_cap: Option<CurrencyMap>,
    pub total_volume: Option<CurrencyMap>,
    pub high_24h: Option<CurrencyMap>,
    pub low_24h: Option<CurrencyMap>,
    pub price_change_24h: Option<f64>,
    pub price_change_percentage_24h: Option<f64>,
    pub market_cap_change_24h: Option<f64>,
    pub market_cap_change_percentage_24h: Option<f64>,
    pub circulating_supply: Option<f64>,
    pub total_supply: Option<f64>,
    pub max_supply: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawCoinDetail {
    pub id: Option<String>,
    pub links: Option<RawLinks>,
    pub description: Option<HashMap<String, Option<String>>>,
    pub image: Option<RawImage>,
    pub market_cap_rank: Option<u32>,
    pub coingecko_rank: Option<u32>,
    pub coingecko_score: Option<f64>,
    pub developer_score: Option<f64>,
    pub community_score: Option<f64>,
    pub liquidity_score: Option<f64>,
    pub public_interest_score: Option<f64>,
    pub market_data: Option<RawMarketData>,
    pub last_updated: Option<String>,
    pub genesis_date: Option<String>,
    pub ico_data: Option<serde_json::Map<String, serde_json::Value>>,
    pub asset_platform_id: Option<String>,
    pub platforms: Option<HashMap<String, Option<String>>>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

fn first_non_empty(values: Option<Vec<Option<String>>>) -> String {
    values
        .and_then(|v| v.into_iter().next().flatten())
        .and_then(|s| non_empty(Some(s)))
        .unwrap_or_default()
}

fn in_currency(map: &Option<CurrencyMap>, vs_currency: &str) -> f64 {
    map.as_ref()
        .and_then(|m| m.get(vs_currency).copied().flatten())
        .unwrap_or(0.0)
}

impl RawMarketData {
    fn into_stats(self, vs_currency: &str) -> MarketStats {
        MarketStats {
            current_price: in_currency(&self.current_price, vs_currency),
            market_cap: in_currency(&self.market_cap, vs_currency),
            total_volume: in_currency(&self.total_volume, vs_currency),
            high_24h: in_currency(&self.high_24h, vs_currency),
            low_24h: in_currency(&self.low_24h, vs_currency),
            price_change_24h: self.price_change_24h.unwrap_or(0.0),
            price_change_percentage_24h: self.price_change_percentage_24h.unwrap_or(0.0),
            market_cap_change_24h: self.market_cap_change_24h.unwrap_or(0.0),
            market_cap_change_percentage_24h: self.market_cap_change_percentage_24h.unwrap_or(0.0),
            circulating_supply: self.circulating_supply.unwrap_or(0.0),
            total_supply: self.total_supply.unwrap_or(0.0),
            max_supply: self.max_supply.unwrap_or(0.0),
        }
    }
}

impl RawCoinDetail {
    /// Flatten into a fully defaulted detail record, pricing in `vs_currency`
    pub fn into_detail(self, vs_currency: &str) -> DetailRecord {
        let links = self.links.unwrap_or_default();

        let telegram = non_empty(links.telegram_channel_identifier)
            .map(|handle| format!("https://t.me/{}", handle))
            .unwrap_or_default();
        let twitter = non_empty(links.twitter_screen_name)
            .map(|handle| format!("https://twitter.com/{}", handle))
            .unwrap_or_default();
        let discord = links
            .chat_url
            .unwrap_or_default()
            .into_iter()
            .flatten()
            .find(|url| url.contains("discord"))
            .unwrap_or_default();
        let description = self
            .description
            .and_then(|mut d| d.remove("en").flatten())
            .and_then(|en| non_empty(Some(en)))
            .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string());

        DetailRecord {
            reddit: non_empty(links.subreddit_url).unwrap_or_default(),
            telegram,
            twitter,
            insta: String::new(),
            youtube: String::new(),
            discord,
            description,
            homepage: first_non_empty(links.homepage),
            blockchain_site: first_non_empty(links.blockchain_site),
            image: self.image.and_then(|i| i.large).unwrap_or_default(),
            market_cap_rank: self.market_cap_rank.unwrap_or(0),
            coingecko_rank: self.coingecko_rank.unwrap_or(0),
            coingecko_score: self.coingecko_score.unwrap_or(0.0),
            developer_score: self.developer_score.unwrap_or(0.0),
            community_score: self.community_score.unwrap_or(0.0),
            liquidity_score: self.liquidity_score.unwrap_or(0.0),
            public_interest_score: self.public_interest_score.unwrap_or(0.0),
            market_data: self
                .market_data
                .unwrap_or_default()
                .into_stats(vs_currency),
            last_updated: self.last_updated.unwrap_or_default(),
            genesis_date: self.genesis_date.unwrap_or_default(),
            ico_data: self.ico_data.unwrap_or_default(),
            asset_platform_id: self.asset_platform_id.unwrap_or_default(),
            platforms: valid_platform_addresses(self.platforms.unwrap_or_default()),
        }
    }
}
