//! Data pipeline module for fetching news, prices, price history and social sentiment
//! Every fetcher degrades to an empty/None result instead of failing the cycle

pub mod errors;
pub mod indicators;
pub mod market;
pub mod news;
pub mod sample;
pub mod sentiment;
pub mod social;

// Re-export commonly used types
pub use errors::{DataError, DataResult};
pub use indicators::compute_indicators;
pub use market::{HistoryClient, PriceClient};
pub use news::NewsClient;
pub use sentiment::SentimentScorer;
pub use social::SocialClient;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Topic bucket assigned to an article by keyword heuristics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Market,
    Regulation,
    Technology,
    Adoption,
    #[default]
    General,
}

/// News article (or social post converted to article shape) with a [0,1] sentiment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    pub source: String,
    pub url: String,
    pub sentiment: f64,
    #[serde(default)]
    pub summary: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default)]
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
}

/// A single social media post. Never persisted on its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialPost {
    pub author: String,
    pub platform: String,
    pub content: String,
    pub sentiment: f64,
    pub timestamp: DateTime<Utc>,
    pub likes: u64,
    pub shares: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Output of the social generator for one asset
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialFeed {
    pub timestamp: DateTime<Utc>,
    pub crypto: String,
    pub posts: Vec<SocialPost>,
    pub sentiment: f64,
    pub trending_topics: Vec<String>,
}

/// Latest spot price for one asset, overwritten every cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSnapshot {
    pub current_price: f64,
    #[serde(default)]
    pub price_change_percentage_24h: Option<f64>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub total_volume: Option<f64>,
    pub last_updated: DateTime<Utc>,
}

/// Hourly OHLC bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// MACD indicator components
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Macd {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// Indicators derived from the rolling hourly close series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorSet {
    pub coin: String,
    pub rsi: Option<f64>,
    pub macd: Option<Macd>,
    pub sma20: Option<f64>,
    pub sma50: Option<f64>,
    pub sma200: Option<f64>,
    pub ema20: Option<f64>,
    pub volume24h: f64,
    pub current_price: f64,
    pub price_change_24h: f64,
    pub timestamp: DateTime<Utc>,
}

/// A tracked cryptocurrency identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Asset {
    id: String,
}

impl Asset {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.trim().to_lowercase(),
        }
    }

    pub fn bitcoin() -> Self {
        Self::new("bitcoin")
    }

    pub fn ethereum() -> Self {
        Self::new("ethereum")
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Known assets have dedicated keyword sets, price ids and social fixtures
    pub fn is_known(&self) -> bool {
        matches!(self.id.as_str(), "bitcoin" | "ethereum")
    }

    pub fn display_name(&self) -> String {
        match self.id.as_str() {
            "bitcoin" => "Bitcoin".to_string(),
            "ethereum" => "Ethereum".to_string(),
            other => {
                let mut chars = other.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            }
        }
    }

    /// Ticker used by the historical OHLC provider
    pub fn symbol(&self) -> String {
        match self.id.as_str() {
            "bitcoin" => "BTC".to_string(),
            "ethereum" => "ETH".to_string(),
            other => other.to_uppercase(),
        }
    }

    pub fn keywords(&self) -> Vec<String> {
        let words: &[&str] = match self.id.as_str() {
            "bitcoin" => &["bitcoin", "btc", "satoshi"],
            "ethereum" => &["ethereum", "eth", "ether", "vitalik"],
            _ => &[],
        };
        if words.is_empty() {
            vec![self.id.clone()]
        } else {
            words.iter().map(|w| w.to_string()).collect()
        }
    }

    /// Case-insensitive keyword match. Short tickers must match a whole word
    /// so "eth" does not hit "method" or "together".
    pub fn matches(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        let words: Vec<&str> = lower
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();

        self.keywords().iter().any(|keyword| {
            if keyword.len() <= 3 {
                words.iter().any(|w| w == keyword)
            } else {
                lower.contains(keyword.as_str())
            }
        })
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// Validation helpers
pub mod validation {
    use super::*;

    /// Validate an asset id from the CLI or configuration
    pub fn validate_asset_id(id: &str) -> DataResult<()> {
        if id.trim().is_empty() {
            return Err(DataError::Config("Asset id cannot be empty".to_string()));
        }

        if !id.trim().chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(DataError::UnknownAsset(id.to_string()));
        }

        Ok(())
    }

    /// Clamp a sentiment score into [0,1]; NaN becomes neutral
    pub fn clamp_sentiment(score: f64) -> f64 {
        if score.is_nan() {
            return 0.5;
        }
        score.clamp(0.0, 1.0)
    }
}
