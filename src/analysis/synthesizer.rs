//! Technical analysis synthesis
//!
//! Turns whatever inputs a cycle managed to gather into one complete
//! [`TechnicalAnalysis`]. Missing inputs degrade individual fields to
//! estimates or nulls; synthesis itself never fails.

use chrono::Utc;

use super::{
    AnalysisIndicators, CombinedNews, IndicatorSource, KeyLevels, MovingAverages, RiskLevel,
    SentimentBreakdown, TechnicalAnalysis,
};
use crate::data::{sentiment::NEUTRAL_SENTIMENT, Asset, IndicatorSet, PriceSnapshot, SocialFeed};

const SUPPORT_FACTORS: [f64; 3] = [0.95, 0.90, 0.85];
const RESISTANCE_FACTORS: [f64; 3] = [1.05, 1.10, 1.15];

/// Placeholder MA20/MA50/MA200 as fractions of spot when history is missing
const MA_PLACEHOLDER_FACTORS: [f64; 3] = [0.98, 0.95, 0.90];

const MIN_SUMMARY_CHARS: usize = 220;
const SUMMARY_PADDING: &str = " Trend assessment prioritizes price momentum, key moving averages, and real-time headline sentiment to frame near-term risk and opportunity.";

const RISK_REMINDERS: [&str; 2] = [
    "Always implement proper risk management and position sizing",
    "Consider dollar-cost averaging for long-term positions",
];

pub fn synthesize(
    asset: &Asset,
    price: Option<&PriceSnapshot>,
    combined: &CombinedNews,
    indicators: Option<&IndicatorSet>,
    social: Option<&SocialFeed>,
) -> TechnicalAnalysis {
    let current_price = price
        .map(|p| p.current_price)
        .or_else(|| indicators.map(|i| i.current_price))
        .filter(|p| p.is_finite() && *p > 0.0);
    let change_24h = price
        .and_then(|p| p.price_change_percentage_24h)
        .or_else(|| indicators.map(|i| i.price_change_24h));

    let computed_rsi = indicators.and_then(|i| i.rsi);
    let rsi = computed_rsi.or_else(|| current_price.map(|_| estimate_rsi(change_24h)));

    let computed_mas = [
        indicators.and_then(|i| i.sma20),
        indicators.and_then(|i| i.sma50),
        indicators.and_then(|i| i.sma200),
    ];
    let [ma20, ma50, ma200] = [0, 1, 2].map(|slot| {
        computed_mas[slot].or_else(|| current_price.map(|p| p * MA_PLACEHOLDER_FACTORS[slot]))
    });

    let source = if computed_rsi.is_some() && computed_mas.iter().all(Option::is_some) {
        IndicatorSource::Computed
    } else if current_price.is_some() {
        IndicatorSource::Estimated
    } else {
        IndicatorSource::Unavailable
    };

    let key_levels = current_price
        .map(|p| KeyLevels {
            support: SUPPORT_FACTORS.iter().map(|f| p * f).collect(),
            resistance: RESISTANCE_FACTORS.iter().map(|f| p * f).collect(),
        })
        .unwrap_or_default();

    let sentiment = sentiment_breakdown(combined, social);

    let indicators_out = AnalysisIndicators {
        rsi,
        macd: indicators.and_then(|i| i.macd),
        moving_averages: MovingAverages { ma20, ma50, ma200 },
        ema20: indicators.and_then(|i| i.ema20),
        volume: indicators
            .map(|i| i.volume24h)
            .or_else(|| price.and_then(|p| p.total_volume)),
        source,
    };

    let summary = build_summary(
        asset,
        current_price,
        change_24h,
        combined.articles.len(),
        &indicators_out,
        &key_levels,
        &sentiment,
        social.map(|s| s.posts.len()).unwrap_or(0),
    );
    let recommendations = build_recommendations(&indicators_out, &key_levels);
    let (risk_level, risk_assessment) = assess_risk(rsi, sentiment.news_sentiment);

    tracing::debug!(
        asset = %asset,
        ?rsi,
        ?source,
        risk = %risk_level,
        "Synthesized technical analysis"
    );

    TechnicalAnalysis {
        timestamp: Utc::now(),
        crypto: asset.id().to_string(),
        crypto_price: price.cloned(),
        summary,
        key_levels,
        indicators: indicators_out,
        sentiment,
        recommendations,
        risk_level,
        risk_assessment,
    }
}

/// Crude RSI stand-in derived from the 24h percent change
pub fn estimate_rsi(change_24h: Option<f64>) -> f64 {
    match change_24h {
        Some(change) if change > 0.0 => (70.0 + change * 2.0).min(90.0),
        Some(change) if change < 0.0 => (30.0 + change * 2.0).max(10.0),
        _ => 50.0,
    }
}

fn sentiment_breakdown(combined: &CombinedNews, social: Option<&SocialFeed>) -> SentimentBreakdown {
    let articles = &combined.articles;
    let news_sentiment = if articles.is_empty() {
        NEUTRAL_SENTIMENT
    } else {
        articles.iter().map(|a| a.sentiment).sum::<f64>() / articles.len() as f64
    };

    let social_feed = social.filter(|s| !s.posts.is_empty());
    let social_sentiment = social_feed.map(|s| s.sentiment).unwrap_or(NEUTRAL_SENTIMENT);

    let mut parts = Vec::with_capacity(2);
    if !articles.is_empty() {
        parts.push(news_sentiment);
    }
    if social_feed.is_some() {
        parts.push(social_sentiment);
    }
    let overall = if parts.is_empty() {
        news_sentiment
    } else {
        parts.iter().sum::<f64>() / parts.len() as f64
    };

    SentimentBreakdown {
        overall,
        news_sentiment,
        social_sentiment,
    }
}

#[allow(clippy::too_many_arguments)]
fn build_summary(
    asset: &Asset,
    current_price: Option<f64>,
    change_24h: Option<f64>,
    article_count: usize,
    indicators: &AnalysisIndicators,
    key_levels: &KeyLevels,
    sentiment: &SentimentBreakdown,
    social_posts: usize,
) -> String {
    let mut summary = format!(
        "{} technical analysis combines price action, volume, and market sentiment from multiple sources.",
        asset.display_name()
    );

    if let Some(price) = current_price {
        summary.push_str(&format!(" Current spot price is around ${}.", format_usd(price)));
        let change = change_24h.unwrap_or(0.0);
        if change.abs() > 5.0 {
            summary.push_str(&format!(
                " The asset is showing strong {} momentum with a {:.2}% 24h change.",
                if change > 0.0 { "bullish" } else { "bearish" },
                change
            ));
        } else {
            summary.push_str(" Price action remains relatively stable with moderate volatility.");
        }
    }

    if article_count > 10 {
        if sentiment.news_sentiment > 0.6 {
            summary.push_str(&format!(
                " Positive news sentiment from {} recent articles supports the bullish outlook.",
                article_count
            ));
        } else if sentiment.news_sentiment < 0.4 {
            summary.push_str(" Cautious sentiment from recent news coverage suggests potential headwinds.");
        } else {
            summary.push_str(&format!(
                " News sentiment is balanced across {} recent headlines.",
                article_count
            ));
        }
    } else {
        summary.push_str(&format!(
            " News sample size is currently {}, indicating lighter coverage in the latest window.",
            article_count
        ));
    }

    if let Some(rsi) = indicators.rsi {
        if rsi > 70.0 {
            summary.push_str(" RSI indicates overbought conditions, suggesting potential pullback risk.");
        } else if rsi < 30.0 {
            summary.push_str(" RSI shows oversold conditions, presenting potential buying opportunity.");
        } else {
            summary.push_str(" RSI remains neutral, implying neither extreme overbought nor oversold conditions.");
        }
    }

    let mas = &indicators.moving_averages;
    if let (Some(ma20), Some(ma50)) = (mas.ma20, mas.ma50) {
        summary.push_str(&format!(
            " Short-term momentum (MA20 vs MA50) {}, while longer-term MA200 sits around ${}.",
            if ma20 > ma50 { "leans bullish" } else { "leans bearish" },
            mas.ma200
                .map(|v| format!("{:.0}", v))
                .unwrap_or_else(|| "N/A".to_string())
        ));
    }

    if let (Some(support), Some(resistance)) = (key_levels.support.first(), key_levels.resistance.first()) {
        summary.push_str(&format!(
            " Key support zones cluster near ${:.0}, with resistance around ${:.0}.",
            support, resistance
        ));
    }

    if social_posts > 0 {
        summary.push_str(&format!(
            " Social sentiment is tracking at {:.0}% based on {} recent posts.",
            sentiment.social_sentiment * 100.0,
            social_posts
        ));
    }

    if summary.chars().count() < MIN_SUMMARY_CHARS {
        summary.push_str(SUMMARY_PADDING);
    }

    summary
}

fn build_recommendations(indicators: &AnalysisIndicators, key_levels: &KeyLevels) -> Vec<String> {
    let mut recommendations = Vec::new();

    match indicators.rsi {
        Some(rsi) if rsi > 70.0 => recommendations.push(
            "Consider taking profits or reducing position size due to overbought conditions".to_string(),
        ),
        Some(rsi) if rsi < 30.0 => recommendations
            .push("Potential accumulation opportunity as asset appears oversold".to_string()),
        _ => {}
    }

    let mas = &indicators.moving_averages;
    if let (Some(ma20), Some(ma50)) = (mas.ma20, mas.ma50) {
        if ma20 > ma50 {
            recommendations.push("Short-term trend is bullish (MA20 above MA50)".to_string());
        } else if ma20 < ma50 {
            recommendations.push("Short-term trend shows weakness (MA20 below MA50)".to_string());
        }
    }

    if !key_levels.support.is_empty() {
        recommendations.push(format!("Key support levels to watch: {}", dollar_list(&key_levels.support)));
    }
    if !key_levels.resistance.is_empty() {
        recommendations.push(format!("Key resistance levels: {}", dollar_list(&key_levels.resistance)));
    }

    recommendations.extend(RISK_REMINDERS.iter().map(|r| r.to_string()));
    recommendations
}

/// Risk level plus its human-readable assessment line.
/// Sentiment skew is measured on news alone; social posts do not dilute it.
pub fn assess_risk(rsi: Option<f64>, news_sentiment: f64) -> (RiskLevel, String) {
    let deviation = (news_sentiment - NEUTRAL_SENTIMENT).abs();
    let mut factors = Vec::new();
    let mut level = RiskLevel::LowToMedium;

    if let Some(rsi) = rsi {
        if rsi > 80.0 || rsi < 20.0 {
            level = RiskLevel::High;
            factors.push("Extreme RSI levels");
        } else if rsi > 70.0 || rsi < 30.0 {
            level = RiskLevel::Medium;
            factors.push("RSI approaching overbought or oversold territory");
        }
    }

    if deviation > 0.3 {
        level = RiskLevel::High;
        factors.push("Extreme sentiment divergence");
    } else if deviation > 0.2 {
        if level == RiskLevel::LowToMedium {
            level = RiskLevel::Medium;
        }
        factors.push("Elevated sentiment skew");
    }

    let factors = if factors.is_empty() {
        "Balanced market conditions".to_string()
    } else {
        factors.join(", ")
    };

    (level, format!("{} risk level. Factors: {}.", level, factors))
}

fn dollar_list(levels: &[f64]) -> String {
    levels
        .iter()
        .map(|v| format!("${:.0}", v))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Thousands-separated dollar amount with at most two decimals
pub fn format_usd(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let (whole, fraction) = (cents / 100, cents % 100);

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    match fraction {
        0 => format!("{}{}", sign, grouped),
        f if f % 10 == 0 => format!("{}{}.{}", sign, grouped, f / 10),
        f => format!("{}{}.{:02}", sign, grouped, f),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Category, Macd, NewsArticle, SocialPost};
    use chrono::Utc;

    fn price(current: f64, change: Option<f64>) -> PriceSnapshot {
        PriceSnapshot {
            current_price: current,
            price_change_percentage_24h: change,
            market_cap: None,
            total_volume: Some(1_000_000.0),
            last_updated: Utc::now(),
        }
    }

    fn news(count: usize, sentiment: f64) -> CombinedNews {
        let articles = (0..count)
            .map(|i| NewsArticle {
                title: format!("Bitcoin headline {}", i),
                source: "wire".to_string(),
                url: format!("https://wire.example.com/{}", i),
                sentiment,
                summary: String::new(),
                timestamp: Utc::now(),
                content: String::new(),
                author: None,
                category: Category::Market,
                platform: None,
            })
            .collect();
        CombinedNews {
            articles,
            last_updated: Utc::now(),
            source_count: 1,
            sentiment_score: sentiment,
        }
    }

    fn indicator_set(rsi: Option<f64>) -> IndicatorSet {
        IndicatorSet {
            coin: "bitcoin".to_string(),
            rsi,
            macd: Some(Macd {
                macd: 120.0,
                signal: 100.0,
                histogram: 20.0,
            }),
            sma20: Some(44_000.0),
            sma50: Some(43_000.0),
            sma200: Some(40_000.0),
            ema20: Some(44_100.0),
            volume24h: 5_000.0,
            current_price: 45_000.0,
            price_change_24h: 1.0,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_strong_rally_with_positive_news() {
        let analysis = synthesize(
            &Asset::bitcoin(),
            Some(&price(45_000.0, Some(6.5))),
            &news(12, 0.7),
            None,
            None,
        );

        assert_eq!(analysis.indicators.rsi, Some(83.0));
        assert_eq!(analysis.indicators.source, IndicatorSource::Estimated);
        assert!(analysis.summary.contains("strong bullish momentum with a 6.50% 24h change"));
        assert!(analysis.summary.contains("Current spot price is around $45,000."));
        assert!(analysis.summary.contains("Positive news sentiment from 12 recent articles"));
        assert!(analysis.summary.contains("overbought"));
        assert_eq!(analysis.risk_level, RiskLevel::High);
        assert!(analysis.risk_assessment.starts_with("High risk level. Factors: Extreme RSI levels"));
        assert!(analysis.recommendations[0].contains("overbought"));
        assert!((analysis.key_levels.support[0] - 42_750.0).abs() < 1e-6);
        assert!((analysis.key_levels.resistance[2] - 51_750.0).abs() < 1e-6);
        assert_eq!(analysis.indicators.moving_averages.ma20, Some(45_000.0 * 0.98));
        assert!((analysis.sentiment.overall - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_no_inputs_still_complete() {
        let analysis = synthesize(&Asset::ethereum(), None, &CombinedNews::empty(), None, None);

        assert_eq!(analysis.crypto, "ethereum");
        assert!(analysis.crypto_price.is_none());
        assert!(analysis.indicators.rsi.is_none());
        assert!(analysis.indicators.moving_averages.ma20.is_none());
        assert_eq!(analysis.indicators.source, IndicatorSource::Unavailable);
        assert!(analysis.key_levels.support.is_empty());
        assert_eq!(analysis.sentiment.news_sentiment, 0.5);
        assert_eq!(analysis.sentiment.social_sentiment, 0.5);
        assert_eq!(analysis.sentiment.overall, 0.5);
        assert!(analysis.summary.chars().count() >= 220);
        assert!(analysis.summary.contains("News sample size is currently 0"));
        assert_eq!(analysis.recommendations.len(), 2);
        assert_eq!(analysis.risk_level, RiskLevel::LowToMedium);
        assert_eq!(
            analysis.risk_assessment,
            "Low to Medium risk level. Factors: Balanced market conditions."
        );
    }

    #[test]
    fn test_computed_indicators_take_precedence() {
        let analysis = synthesize(
            &Asset::bitcoin(),
            Some(&price(45_000.0, Some(-8.0))),
            &news(3, 0.5),
            Some(&indicator_set(Some(55.0))),
            None,
        );

        assert_eq!(analysis.indicators.rsi, Some(55.0));
        assert_eq!(analysis.indicators.source, IndicatorSource::Computed);
        assert_eq!(analysis.indicators.moving_averages.ma50, Some(43_000.0));
        assert_eq!(analysis.indicators.volume, Some(5_000.0));
        assert_eq!(analysis.indicators.macd.as_ref().map(|m| m.histogram), Some(20.0));
        assert!(analysis.summary.contains("strong bearish momentum with a -8.00% 24h change"));
        assert!(analysis.summary.contains("RSI remains neutral"));
        assert!(analysis.summary.contains("leans bullish, while longer-term MA200 sits around $40000"));
        assert!(analysis
            .recommendations
            .contains(&"Short-term trend is bullish (MA20 above MA50)".to_string()));
    }

    #[test]
    fn test_partial_history_is_estimated() {
        let mut partial = indicator_set(None);
        partial.sma200 = None;
        let analysis = synthesize(&Asset::bitcoin(), None, &news(0, 0.5), Some(&partial), None);

        assert_eq!(analysis.indicators.source, IndicatorSource::Estimated);
        // 24h change from the indicator set drives the estimate
        assert_eq!(analysis.indicators.rsi, Some(72.0));
        assert_eq!(analysis.indicators.moving_averages.ma200, Some(45_000.0 * 0.90));
    }

    #[test]
    fn test_social_feed_contributes_to_sentiment() {
        let social = SocialFeed {
            timestamp: Utc::now(),
            crypto: "bitcoin".to_string(),
            posts: vec![SocialPost {
                author: "PlanB".to_string(),
                platform: "Twitter".to_string(),
                content: "Bitcoin".to_string(),
                sentiment: 0.9,
                timestamp: Utc::now(),
                likes: 0,
                shares: 0,
                url: None,
            }],
            sentiment: 0.9,
            trending_topics: Vec::new(),
        };

        let analysis = synthesize(&Asset::bitcoin(), None, &news(2, 0.5), None, Some(&social));
        assert!((analysis.sentiment.overall - 0.7).abs() < 1e-9);
        assert!(analysis.summary.contains("Social sentiment is tracking at 90% based on 1 recent posts."));
    }

    #[test]
    fn test_risk_uses_news_sentiment_not_overall() {
        let asset = Asset::bitcoin();
        let social = crate::data::SocialClient::new().fetch_social(&asset);
        let analysis = synthesize(
            &asset,
            Some(&price(45_000.0, Some(1.0))),
            &news(12, 0.85),
            Some(&indicator_set(Some(50.0))),
            Some(&social),
        );

        assert!(analysis.sentiment.overall < 0.8);
        assert_eq!(analysis.risk_level, RiskLevel::High);
        assert!(analysis.risk_assessment.contains("Extreme sentiment divergence"));
    }

    #[test]
    fn test_estimate_rsi_bounds() {
        assert_eq!(estimate_rsi(Some(30.0)), 90.0);
        assert_eq!(estimate_rsi(Some(-30.0)), 10.0);
        assert_eq!(estimate_rsi(Some(-5.0)), 20.0);
        assert_eq!(estimate_rsi(Some(0.0)), 50.0);
        assert_eq!(estimate_rsi(None), 50.0);
    }

    #[test]
    fn test_risk_levels() {
        assert_eq!(assess_risk(Some(15.0), 0.5).0, RiskLevel::High);
        assert_eq!(assess_risk(Some(50.0), 0.9).0, RiskLevel::High);
        assert_eq!(assess_risk(Some(75.0), 0.5).0, RiskLevel::Medium);
        assert_eq!(assess_risk(Some(50.0), 0.25).0, RiskLevel::Medium);
        assert_eq!(assess_risk(None, 0.5).0, RiskLevel::LowToMedium);

        let (_, text) = assess_risk(Some(85.0), 0.1);
        assert_eq!(
            text,
            "High risk level. Factors: Extreme RSI levels, Extreme sentiment divergence."
        );
    }

    #[test]
    fn test_format_usd() {
        assert_eq!(format_usd(45_000.0), "45,000");
        assert_eq!(format_usd(1_234_567.891), "1,234,567.89");
        assert_eq!(format_usd(2_500.5), "2,500.5");
        assert_eq!(format_usd(999.0), "999");
    }
}
