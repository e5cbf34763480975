//! Aggregation cycle orchestrator
//! Coordinates one asset's pipeline: news → social → price → indicators → combine → synthesize → persist

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::{
    analysis::{combine, synthesize, CombinedNews, TechnicalAnalysis},
    config::Config,
    data::{
        sample, Asset, HistoryClient, NewsArticle, NewsClient, PriceClient, PriceSnapshot,
        SocialClient,
    },
    storage::{HistoryEntry, SnapshotStore},
};

/// Number of placeholder articles generated when no news exists at all
const SAMPLE_ARTICLE_COUNT: usize = 20;

/// Where a category of data came from in a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataOrigin {
    Live,
    Cached,
    Sample,
    Missing,
}

/// Everything one asset's cycle produced
#[derive(Debug, Clone)]
pub struct CycleOutput {
    pub asset: Asset,
    pub news: CombinedNews,
    pub analysis: TechnicalAnalysis,
    pub price: Option<PriceSnapshot>,
    pub news_origin: DataOrigin,
    pub price_origin: DataOrigin,
}

/// Outcome of a multi-asset cycle
#[derive(Debug, Default)]
pub struct CycleReport {
    pub completed: Vec<CycleOutput>,
    pub failed: Vec<(Asset, String)>,
}

/// Per-cycle aggregation pipeline
pub struct Aggregator {
    config: Config,
    news_client: NewsClient,
    price_client: PriceClient,
    history_client: HistoryClient,
    social_client: SocialClient,
    store: SnapshotStore,
}

impl Aggregator {
    pub fn new(config: Config) -> Result<Self> {
        info!("Initializing aggregator");

        let news_client = NewsClient::new(&config).context("Failed to build news client")?;
        let price_client = PriceClient::new(&config).context("Failed to build price client")?;
        let history_client = HistoryClient::new(&config).context("Failed to build history client")?;
        let store = SnapshotStore::new(config.pipeline.data_dir.clone());

        Ok(Self {
            config,
            news_client,
            price_client,
            history_client,
            social_client: SocialClient::new(),
            store,
        })
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn assets(&self) -> Vec<Asset> {
        self.config.pipeline.coins.iter().map(|c| Asset::new(c)).collect()
    }

    /// Run the full pipeline for one asset and persist the result.
    /// Source failures degrade to cached or sample data; only persistence errors surface.
    pub async fn aggregate(&self, asset: &Asset) -> Result<CycleOutput> {
        info!(asset = %asset, "Starting data aggregation and analysis");

        // Step 1: news with cache / sample fallback
        let (articles, news_origin) = self.gather_news(asset).await;
        info!(asset = %asset, count = articles.len(), origin = ?news_origin, "News gathered");

        // Step 2: social
        let social = self.social_client.fetch_social(asset);

        // Step 3: price with cache / sample fallback
        let (price, price_origin) = self.gather_price(asset).await;
        match &price {
            Some(p) => info!(asset = %asset, price = p.current_price, origin = ?price_origin, "Price gathered"),
            None => warn!(asset = %asset, "Price data unavailable"),
        }

        // Step 4: indicators
        let indicators = self.history_client.analyze(asset).await;
        if indicators.is_none() {
            warn!(asset = %asset, "Technical indicator data unavailable");
        }

        // Step 5: merge news and social
        let news = combine(articles, Some(&social), self.config.feeds.max_articles);

        // Step 6: synthesize
        let analysis = synthesize(asset, price.as_ref(), &news, indicators.as_ref(), Some(&social));

        // Step 7: persist
        self.store
            .save(asset, &news, &analysis, price.as_ref())
            .await
            .with_context(|| format!("Failed to save snapshots for {}", asset))?;
        let retained = self
            .store
            .history()
            .append(asset, HistoryEntry::from_cycle(&news, &analysis))
            .await
            .with_context(|| format!("Failed to append history for {}", asset))?;

        info!(
            asset = %asset,
            articles = news.articles.len(),
            sources = news.source_count,
            risk = %analysis.risk_level,
            history = retained,
            "Completed analysis"
        );

        Ok(CycleOutput {
            asset: asset.clone(),
            news,
            analysis,
            price,
            news_origin,
            price_origin,
        })
    }

    /// Aggregate every asset in sequence. A failing asset is logged and skipped.
    pub async fn run_cycle(&self, assets: &[Asset]) -> CycleReport {
        let mut report = CycleReport::default();

        for asset in assets {
            match self.aggregate(asset).await {
                Ok(output) => report.completed.push(output),
                Err(e) => {
                    error!(asset = %asset, error = %format!("{:#}", e), "Aggregation failed");
                    report.failed.push((asset.clone(), format!("{:#}", e)));
                }
            }
        }

        info!(
            completed = report.completed.len(),
            failed = report.failed.len(),
            "Aggregation cycle finished"
        );
        report
    }

    async fn gather_news(&self, asset: &Asset) -> (Vec<NewsArticle>, DataOrigin) {
        let fetched = self.news_client.fetch_news(asset).await;
        if !fetched.is_empty() {
            return (fetched, DataOrigin::Live);
        }

        warn!(asset = %asset, "No news data fetched, using fallback data");
        if let Some(cached) = self.store.load_news(asset).await {
            // Social posts are re-merged fresh each cycle
            let articles: Vec<NewsArticle> = cached
                .articles
                .into_iter()
                .filter(|a| !a.source.starts_with("social-"))
                .collect();
            if !articles.is_empty() {
                return (articles, DataOrigin::Cached);
            }
        }

        if self.config.pipeline.allow_sample_data {
            warn!(asset = %asset, "Using sample news (not authoritative)");
            return (sample::sample_news(asset, SAMPLE_ARTICLE_COUNT), DataOrigin::Sample);
        }

        (Vec::new(), DataOrigin::Missing)
    }

    async fn gather_price(&self, asset: &Asset) -> (Option<PriceSnapshot>, DataOrigin) {
        if let Some(price) = self.price_client.fetch_price(asset).await {
            return (Some(price), DataOrigin::Live);
        }
        if let Some(cached) = self.store.load_price(asset).await {
            return (Some(cached), DataOrigin::Cached);
        }
        if self.config.pipeline.allow_sample_data {
            warn!(asset = %asset, "Using sample price (not authoritative)");
            return (Some(sample::sample_price(asset)), DataOrigin::Sample);
        }
        (None, DataOrigin::Missing)
    }

    /// Fetch and persist spot prices only
    pub async fn refresh_prices(&self, assets: &[Asset]) -> usize {
        let mut written = 0;
        for asset in assets {
            let Some(price) = self.price_client.fetch_price(asset).await else {
                warn!(asset = %asset, "Price unavailable");
                continue;
            };
            match self.store.save_price(asset, &price).await {
                Ok(()) => {
                    info!(asset = %asset, price = price.current_price, "Updated price");
                    written += 1;
                }
                Err(e) => error!(asset = %asset, error = %format!("{:#}", e), "Failed to write price"),
            }
        }
        written
    }
}
