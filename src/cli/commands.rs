use anyhow::{bail, Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use coinpulse::{
    data::{validation::validate_asset_id, Asset},
    orchestrator::{Aggregator, PriceRunner, Scheduler},
    storage::{SnapshotKind, SnapshotStore},
    system, Config,
};

use super::SnapshotArg;

fn parse_asset(raw: &str) -> Result<Asset> {
    validate_asset_id(raw).with_context(|| format!("Invalid coin '{}'", raw))?;
    Ok(Asset::new(raw))
}

/// Run one aggregation cycle for one or all configured assets
pub async fn aggregate(config: Config, coin: Option<String>) -> Result<()> {
    let aggregator = Aggregator::new(config)?;
    let assets = match coin {
        Some(raw) => vec![parse_asset(&raw)?],
        None => aggregator.assets(),
    };

    let report = aggregator.run_cycle(&assets).await;

    for output in &report.completed {
        println!(
            "✅ {}: {} articles from {} sources, sentiment {:.2}, {}",
            output.asset,
            output.news.articles.len(),
            output.news.source_count,
            output.news.sentiment_score,
            output.analysis.risk_assessment
        );
    }
    for (asset, reason) in &report.failed {
        println!("❌ {}: {}", asset, reason);
    }

    if report.completed.is_empty() && !report.failed.is_empty() {
        bail!("Aggregation failed for every asset");
    }
    Ok(())
}

/// Aggregate at startup and on every scrape interval until Ctrl-C
pub async fn watch(config: Config) -> Result<()> {
    let period = Duration::from_secs(config.pipeline.scrape_interval_seconds);
    let aggregator = Arc::new(Aggregator::new(config)?);
    let assets = aggregator.assets();

    let count = assets.len();
    let scheduler = Scheduler::aggregation(aggregator, assets, period);

    info!(assets = count, interval_secs = scheduler.period().as_secs(), "Aggregation scheduler configured");
    scheduler.run().await
}

/// Refresh price files once or on the price interval
pub async fn prices(config: Config, once: bool) -> Result<()> {
    let period = Duration::from_secs(config.pipeline.price_interval_seconds);
    let aggregator = Arc::new(Aggregator::new(config)?);
    let assets = aggregator.assets();
    let runner: PriceRunner = Scheduler::prices(aggregator, assets, period);

    if once {
        runner.run_once().await
    } else {
        runner.run().await
    }
}

/// Print a stored snapshot as pretty JSON
pub async fn show(config: Config, coin: String, kind: SnapshotArg) -> Result<()> {
    let asset = parse_asset(&coin)?;
    let store = SnapshotStore::new(config.pipeline.data_dir.clone());
    let kind = match kind {
        SnapshotArg::News => SnapshotKind::News,
        SnapshotArg::Technical => SnapshotKind::Technical,
        SnapshotArg::Price => SnapshotKind::Price,
        SnapshotArg::History => SnapshotKind::History,
    };

    match store.load_raw(&asset, kind).await {
        Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        None => {
            warn!(asset = %asset, kind = ?kind, "Snapshot not found");
            println!(
                "No {:?} data for {} in {}",
                kind,
                asset,
                store.data_dir().display()
            );
        }
    }
    Ok(())
}

/// List active sessions from the configured provider
pub async fn sessions(config: Config, history: Option<String>, limit: usize) -> Result<()> {
    let provider = system::from_config(&config.sessions, config.feeds.timeout_seconds)?;

    let active = provider.active_sessions().await?;
    println!("🧵 {} active sessions", active.len());
    for session in &active {
        println!(
            "  {} [{}] {} ({}) last active {}",
            session.key,
            session.kind,
            session.label,
            session.status,
            session.last_activity.to_rfc3339()
        );
    }

    if let Some(key) = history {
        let history = provider.session_history(&key, limit).await?;
        println!("\n📜 {} messages for {}", history.messages.len(), key);
        for message in &history.messages {
            println!("  {}: {}", message.role, message.content);
        }
    }
    Ok(())
}
