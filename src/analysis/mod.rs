//! Analysis module: merges news with social posts and synthesizes the
//! per-asset technical analysis snapshot consumed by the dashboard

pub mod combiner;
pub mod synthesizer;

pub use combiner::combine;
pub use synthesizer::synthesize;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::data::{Macd, NewsArticle, PriceSnapshot};

/// Merged, deduplicated news + social article set for one asset and cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedNews {
    pub articles: Vec<NewsArticle>,
    pub last_updated: DateTime<Utc>,
    pub source_count: usize,
    pub sentiment_score: f64,
}

impl CombinedNews {
    pub fn empty() -> Self {
        Self {
            articles: Vec::new(),
            last_updated: Utc::now(),
            source_count: 0,
            sentiment_score: crate::data::sentiment::NEUTRAL_SENTIMENT,
        }
    }
}

/// Where the RSI and moving averages of an analysis came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndicatorSource {
    /// Every value came from the indicator calculator
    Computed,
    /// At least one value is a placeholder derived from spot price
    Estimated,
    /// No price information at all
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    High,
    Medium,
    #[serde(rename = "Low to Medium")]
    LowToMedium,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::High => "High",
            RiskLevel::Medium => "Medium",
            RiskLevel::LowToMedium => "Low to Medium",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct KeyLevels {
    pub support: Vec<f64>,
    pub resistance: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MovingAverages {
    pub ma20: Option<f64>,
    pub ma50: Option<f64>,
    pub ma200: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisIndicators {
    pub rsi: Option<f64>,
    pub macd: Option<Macd>,
    pub moving_averages: MovingAverages,
    pub ema20: Option<f64>,
    pub volume: Option<f64>,
    pub source: IndicatorSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentBreakdown {
    pub overall: f64,
    pub news_sentiment: f64,
    pub social_sentiment: f64,
}

/// One asset's analysis for one cycle. Each run fully replaces the previous file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalAnalysis {
    pub timestamp: DateTime<Utc>,
    pub crypto: String,
    pub crypto_price: Option<PriceSnapshot>,
    pub summary: String,
    pub key_levels: KeyLevels,
    pub indicators: AnalysisIndicators,
    pub sentiment: SentimentBreakdown,
    pub recommendations: Vec<String>,
    pub risk_level: RiskLevel,
    pub risk_assessment: String,
}
