//! Sample data used only when `ALLOW_SAMPLE_DATA=true`.
//! Nothing here is authoritative; callers log whenever it is used.

use chrono::{Duration, Utc};
use rand::Rng;

use super::{Asset, Candle, Category, NewsArticle, PriceSnapshot};

const SAMPLE_SOURCES: &[&str] = &["coindesk", "cointelegraph", "theblock", "decrypt", "cryptoslate"];

fn base_price(asset: &Asset) -> f64 {
    if asset.id() == "bitcoin" {
        45_000.0
    } else {
        2_500.0
    }
}

/// `count` placeholder articles spread over the last 24 hours
pub fn sample_news(asset: &Asset, count: usize) -> Vec<NewsArticle> {
    let mut rng = rand::thread_rng();
    let name = asset.display_name();
    let now = Utc::now();

    (0..count)
        .map(|i| {
            let age = Duration::seconds(rng.gen_range(0..24 * 60 * 60));
            NewsArticle {
                title: format!("{} Analysis: Key Technical Levels and Market Outlook {}", name, i + 1),
                source: SAMPLE_SOURCES[rng.gen_range(0..SAMPLE_SOURCES.len())].to_string(),
                url: format!("https://example.com/{}/news-{}", asset.id(), i + 1),
                sentiment: rng.gen_range(0.0..=1.0),
                summary: format!(
                    "Comprehensive analysis of {} market conditions including technical indicators, support/resistance levels, and trading volume patterns.",
                    name
                ),
                timestamp: now - age,
                content: String::new(),
                author: None,
                category: Category::Market,
                platform: None,
            }
        })
        .collect()
}

/// Placeholder price around the asset's base price (±5%)
pub fn sample_price(asset: &Asset) -> PriceSnapshot {
    let mut rng = rand::thread_rng();
    let current_price = base_price(asset) * (1.0 + rng.gen_range(-0.05..0.05));

    PriceSnapshot {
        current_price,
        price_change_percentage_24h: Some(rng.gen_range(-10.0..10.0)),
        market_cap: Some(current_price * 19_000_000.0),
        total_volume: Some(current_price * 50_000.0),
        last_updated: Utc::now(),
    }
}

/// Random-walk hourly series ending at the current hour, oldest first
pub fn synthetic_candles(asset: &Asset, limit: usize) -> Vec<Candle> {
    let mut rng = rand::thread_rng();
    let now = Utc::now();
    let mut price = base_price(asset);

    (0..=limit)
        .rev()
        .map(|hours_back| {
            price *= 1.0 + rng.gen_range(-0.02..0.02);
            Candle {
                time: now - Duration::hours(hours_back as i64),
                open: price * (1.0 - rng.gen_range(0.0..0.02)),
                high: price * (1.0 + rng.gen_range(0.0..0.03)),
                low: price * (1.0 - rng.gen_range(0.0..0.03)),
                close: price,
                volume: rng.gen_range(0.0..1_000_000.0),
            }
        })
        .collect()
}
