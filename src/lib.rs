// CoinPulse - Crypto News and Technical Analysis Aggregator
// Fetches news, social sentiment, prices and hourly history for tracked assets,
// synthesizes a technical analysis and writes JSON snapshots for the dashboard.

#![deny(clippy::unwrap_used)]

pub mod analysis;
pub mod config;
pub mod data;
pub mod orchestrator;
pub mod storage;
pub mod system;

// Re-export commonly used items
pub use analysis::{CombinedNews, TechnicalAnalysis};
pub use config::Config;
pub use data::{Asset, IndicatorSet, NewsArticle, PriceSnapshot, SocialFeed};
