use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use coinpulse::{
    config::Config,
    data::Asset,
    orchestrator::{Aggregator, DataOrigin, Scheduler},
    storage::SnapshotStore,
    analysis::IndicatorSource,
};

/// Configuration whose every upstream refuses connections immediately
fn create_offline_config(data_dir: &Path, allow_sample_data: bool) -> Config {
    let mut config = Config::default();
    config.apis.news_api_key = None;
    config.apis.newsapi_base_url = "http://127.0.0.1:9".to_string();
    config.apis.coingecko_base_url = "http://127.0.0.1:9".to_string();
    config.apis.cryptocompare_base_url = "http://127.0.0.1:9".to_string();
    config.feeds.sources.clear();
    config.feeds.timeout_seconds = 2;
    config.pipeline.data_dir = data_dir.to_path_buf();
    config.pipeline.allow_sample_data = allow_sample_data;
    config
}

#[tokio::test]
async fn test_offline_cycle_uses_sample_data_when_allowed() -> Result<()> {
    let dir = TempDir::new()?;
    let aggregator = Aggregator::new(create_offline_config(dir.path(), true))?;
    let asset = Asset::bitcoin();

    let output = aggregator.aggregate(&asset).await?;

    assert_eq!(output.news_origin, DataOrigin::Sample);
    assert_eq!(output.price_origin, DataOrigin::Sample);
    // 20 sample articles plus 5 social posts
    assert_eq!(output.news.articles.len(), 25);
    assert!(output.news.source_count >= 2);
    assert!(output.analysis.crypto_price.is_some());
    assert!(output.analysis.indicators.rsi.is_some());
    assert_ne!(output.analysis.indicators.source, IndicatorSource::Unavailable);

    for name in [
        "bitcoin_news_v2.json",
        "bitcoin_news.json",
        "bitcoin_technical_v2.json",
        "bitcoin_technical.json",
        "bitcoin_price.json",
        "bitcoin_history.json",
    ] {
        assert!(dir.path().join(name).exists(), "missing {}", name);
    }

    let history = aggregator.store().history().load(&asset).await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].article_count, 25);

    Ok(())
}

#[tokio::test]
async fn test_offline_cycle_without_sample_data_is_still_complete() -> Result<()> {
    let dir = TempDir::new()?;
    let aggregator = Aggregator::new(create_offline_config(dir.path(), false))?;
    let asset = Asset::ethereum();

    let output = aggregator.aggregate(&asset).await?;

    assert_eq!(output.news_origin, DataOrigin::Missing);
    assert_eq!(output.price_origin, DataOrigin::Missing);
    assert!(output.price.is_none());
    assert!(output.analysis.indicators.rsi.is_none());
    assert_eq!(output.analysis.indicators.source, IndicatorSource::Unavailable);
    assert!(output.analysis.key_levels.support.is_empty());
    // Social posts are the only records
    assert_eq!(output.news.articles.len(), 5);
    assert!(output.news.articles.iter().all(|a| a.source == "social-twitter"));
    assert!(!dir.path().join("ethereum_price.json").exists());
    assert!(dir.path().join("ethereum_technical_v2.json").exists());

    Ok(())
}

#[tokio::test]
async fn test_cached_snapshots_back_fill_failed_sources() -> Result<()> {
    let dir = TempDir::new()?;
    let asset = Asset::bitcoin();

    let seeded = Aggregator::new(create_offline_config(dir.path(), true))?
        .aggregate(&asset)
        .await?;
    let seeded_price = seeded.price.as_ref().map(|p| p.current_price);

    let aggregator = Aggregator::new(create_offline_config(dir.path(), false))?;
    let output = aggregator.aggregate(&asset).await?;

    assert_eq!(output.news_origin, DataOrigin::Cached);
    assert_eq!(output.price_origin, DataOrigin::Cached);
    assert_eq!(output.price.as_ref().map(|p| p.current_price), seeded_price);
    // Cached social records are replaced by this cycle's posts, not accumulated
    let social = output
        .news
        .articles
        .iter()
        .filter(|a| a.source.starts_with("social-"))
        .count();
    assert_eq!(social, 5);
    assert_eq!(output.news.articles.len(), 25);

    let history = SnapshotStore::new(dir.path()).history().load(&asset).await;
    assert_eq!(history.len(), 2);
    assert!(history[0].timestamp >= history[1].timestamp);

    Ok(())
}

#[tokio::test]
async fn test_failing_asset_does_not_stop_cycle() -> Result<()> {
    let dir = TempDir::new()?;
    // A regular file where the data directory should be makes every save fail
    let blocked = dir.path().join("not-a-dir");
    std::fs::write(&blocked, "x")?;

    let aggregator = Aggregator::new(create_offline_config(&blocked, false))?;
    let assets = vec![Asset::bitcoin(), Asset::ethereum()];

    let report = aggregator.run_cycle(&assets).await;
    assert!(report.completed.is_empty());
    assert_eq!(report.failed.len(), 2);
    assert_eq!(report.failed[1].0, Asset::ethereum());

    Ok(())
}

#[tokio::test]
async fn test_aggregation_scheduler_runs_at_startup() -> Result<()> {
    let dir = TempDir::new()?;
    let aggregator = Arc::new(Aggregator::new(create_offline_config(dir.path(), true))?);
    let scheduler = Scheduler::aggregation(aggregator, vec![Asset::bitcoin()], Duration::from_secs(600));

    scheduler.run_once().await?;

    assert_eq!(scheduler.started(), 1);
    assert!(dir.path().join("bitcoin_technical_v2.json").exists());
    Ok(())
}

#[tokio::test]
async fn test_price_runner_writes_nothing_when_prices_unavailable() -> Result<()> {
    let dir = TempDir::new()?;
    let aggregator = Arc::new(Aggregator::new(create_offline_config(dir.path(), true))?);
    let runner = Scheduler::prices(aggregator, vec![Asset::bitcoin()], Duration::from_secs(30));

    runner.run_once().await?;

    // The price loop never substitutes sample prices
    assert!(!dir.path().join("bitcoin_price.json").exists());
    Ok(())
}
