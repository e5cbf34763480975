use anyhow::Result;
use chrono::Utc;
use tempfile::TempDir;

use coinpulse::{
    analysis::{combine, synthesize, CombinedNews, RiskLevel},
    data::{Asset, Category, NewsArticle, PriceSnapshot, SocialClient},
    storage::{SnapshotStore, HISTORY_CAP},
};

fn article(index: usize, source: &str, sentiment: f64) -> NewsArticle {
    NewsArticle {
        title: format!("Bitcoin market update {}", index),
        source: source.to_string(),
        url: format!("https://news.example.com/bitcoin/{}", index),
        sentiment,
        summary: "Bitcoin market update".to_string(),
        timestamp: Utc::now(),
        content: String::new(),
        author: None,
        category: Category::Market,
        platform: None,
    }
}

fn rally_price() -> PriceSnapshot {
    PriceSnapshot {
        current_price: 45_000.0,
        price_change_percentage_24h: Some(6.5),
        market_cap: Some(880_000_000_000.0),
        total_volume: Some(30_000_000_000.0),
        last_updated: Utc::now(),
    }
}

#[test]
fn test_rally_scenario_end_to_end() {
    let asset = Asset::bitcoin();
    let news = combine(
        (0..12).map(|i| article(i, "coindesk", 0.7)).collect(),
        None,
        50,
    );

    let analysis = synthesize(&asset, Some(&rally_price()), &news, None, None);

    assert_eq!(analysis.indicators.rsi, Some(83.0));
    assert!(analysis.summary.contains("bullish momentum"));
    assert!(analysis.summary.contains("overbought"));
    assert_eq!(analysis.risk_level, RiskLevel::High);

    let support = &analysis.key_levels.support;
    let resistance = &analysis.key_levels.resistance;
    assert!(support.windows(2).all(|w| w[0] > w[1]));
    assert!(resistance.windows(2).all(|w| w[0] < w[1]));
    assert!(support[0] < 45_000.0 && resistance[0] > 45_000.0);
}

#[test]
fn test_shared_urls_across_news_and_social_appear_once() {
    let asset = Asset::bitcoin();
    let mut feed = SocialClient::new().fetch_social(&asset);
    feed.posts[0].url = Some("https://news.example.com/bitcoin/1".to_string());

    let news = combine(vec![article(1, "coindesk", 0.6), article(2, "decrypt", 0.4)], Some(&feed), 50);

    let shared = news
        .articles
        .iter()
        .filter(|a| a.url == "https://news.example.com/bitcoin/1")
        .count();
    assert_eq!(shared, 1);
    assert_eq!(news.articles.len(), 6);
    assert_eq!(news.source_count, 3);
    assert!(news.articles.iter().all(|a| (0.0..=1.0).contains(&a.sentiment)));
}

#[tokio::test]
async fn test_technical_analysis_round_trips_through_store() -> Result<()> {
    let dir = TempDir::new()?;
    let store = SnapshotStore::new(dir.path());
    let asset = Asset::bitcoin();
    let social = SocialClient::new().fetch_social(&asset);
    let news = combine((0..3).map(|i| article(i, "wire", 0.55)).collect(), Some(&social), 50);
    let price = rally_price();
    let analysis = synthesize(&asset, Some(&price), &news, None, Some(&social));

    store.save(&asset, &news, &analysis, Some(&price)).await?;

    assert_eq!(store.load_technical(&asset).await, Some(analysis));
    assert_eq!(store.load_news(&asset).await, Some(news));

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("bitcoin_technical_v2.json"))?)?;
    for key in ["cryptoPrice", "keyLevels", "riskAssessment", "recommendations"] {
        assert!(raw.get(key).is_some(), "missing {}", key);
    }
    assert!(raw["indicators"]["movingAverages"]["ma20"].is_number());
    assert_eq!(raw["indicators"]["source"], "estimated");
    assert!(raw["cryptoPrice"]["current_price"].is_number());
    assert!(raw["sentiment"]["newsSentiment"].is_number());

    Ok(())
}

#[tokio::test]
async fn test_empty_inputs_produce_complete_snapshot() -> Result<()> {
    let dir = TempDir::new()?;
    let store = SnapshotStore::new(dir.path());
    let asset = Asset::new("Solana");
    let news = CombinedNews::empty();

    let analysis = synthesize(&asset, None, &news, None, None);
    store.save(&asset, &news, &analysis, None).await?;

    let loaded = store
        .load_technical(&asset)
        .await
        .ok_or_else(|| anyhow::anyhow!("technical snapshot missing"))?;
    assert_eq!(loaded.crypto, "solana");
    assert!(loaded.crypto_price.is_none());
    assert!(!loaded.summary.is_empty());
    assert!(!loaded.recommendations.is_empty());
    assert!(!loaded.risk_assessment.is_empty());
    Ok(())
}

#[test]
fn test_history_cap_constant() {
    assert_eq!(HISTORY_CAP, 1000);
}
