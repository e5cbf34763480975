//! On-disk JSON snapshots shared with the dashboard
//!
//! Every per-asset file is replaced wholesale each cycle through a sibling
//! temp file and a rename, so readers never observe a half-written file.
//! Only the history log grows, and it is capped at [`HISTORY_CAP`] entries.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::analysis::{CombinedNews, TechnicalAnalysis};
use crate::data::{Asset, PriceSnapshot};

/// Maximum number of retained history entries per asset
pub const HISTORY_CAP: usize = 1000;

/// Which snapshot file family to address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotKind {
    News,
    Technical,
    Price,
    History,
}

impl SnapshotKind {
    /// File names to try in order; the first is the current format
    fn file_names(&self, asset: &Asset) -> Vec<String> {
        let id = asset.id();
        match self {
            SnapshotKind::News => vec![format!("{}_news_v2.json", id), format!("{}_news.json", id)],
            SnapshotKind::Technical => vec![
                format!("{}_technical_v2.json", id),
                format!("{}_technical.json", id),
            ],
            SnapshotKind::Price => vec![format!("{}_price.json", id)],
            SnapshotKind::History => vec![format!("{}_history.json", id)],
        }
    }
}

/// One line of the per-asset cycle history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub crypto: String,
    pub article_count: usize,
    pub source_count: usize,
    pub sentiment_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rsi: Option<f64>,
}

impl HistoryEntry {
    pub fn from_cycle(combined: &CombinedNews, analysis: &TechnicalAnalysis) -> Self {
        Self {
            timestamp: analysis.timestamp,
            crypto: analysis.crypto.clone(),
            article_count: combined.articles.len(),
            source_count: combined.source_count,
            sentiment_score: combined.sentiment_score,
            price: analysis.crypto_price.as_ref().map(|p| p.current_price),
            rsi: analysis.indicators.rsi,
        }
    }
}

/// Reader and writer for the per-asset snapshot files under one data directory
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    data_dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of the current-format file for `kind`
    pub fn path_for(&self, asset: &Asset, kind: SnapshotKind) -> PathBuf {
        let names = kind.file_names(asset);
        self.data_dir.join(&names[0])
    }

    /// Persist one cycle's outputs. News and technical files are written in
    /// both the current and the legacy name; price only when present.
    pub async fn save(
        &self,
        asset: &Asset,
        combined: &CombinedNews,
        analysis: &TechnicalAnalysis,
        price: Option<&PriceSnapshot>,
    ) -> Result<()> {
        fs::create_dir_all(&self.data_dir)
            .await
            .with_context(|| format!("Failed to create data dir {}", self.data_dir.display()))?;

        for name in SnapshotKind::News.file_names(asset) {
            write_json_atomic(&self.data_dir.join(name), combined).await?;
        }
        for name in SnapshotKind::Technical.file_names(asset) {
            write_json_atomic(&self.data_dir.join(name), analysis).await?;
        }
        if let Some(price) = price {
            self.save_price(asset, price).await?;
        }

        tracing::info!(
            asset = %asset,
            articles = combined.articles.len(),
            dir = %self.data_dir.display(),
            "Saved snapshot files"
        );
        Ok(())
    }

    pub async fn save_price(&self, asset: &Asset, price: &PriceSnapshot) -> Result<()> {
        fs::create_dir_all(&self.data_dir)
            .await
            .with_context(|| format!("Failed to create data dir {}", self.data_dir.display()))?;
        write_json_atomic(&self.path_for(asset, SnapshotKind::Price), price).await
    }

    pub async fn load_news(&self, asset: &Asset) -> Option<CombinedNews> {
        self.load_first(asset, SnapshotKind::News).await
    }

    pub async fn load_technical(&self, asset: &Asset) -> Option<TechnicalAnalysis> {
        self.load_first(asset, SnapshotKind::Technical).await
    }

    pub async fn load_price(&self, asset: &Asset) -> Option<PriceSnapshot> {
        self.load_first(asset, SnapshotKind::Price).await
    }

    /// Raw JSON for any kind, following the same fallback chain
    pub async fn load_raw(&self, asset: &Asset, kind: SnapshotKind) -> Option<serde_json::Value> {
        self.load_first(asset, kind).await
    }

    async fn load_first<T: DeserializeOwned>(&self, asset: &Asset, kind: SnapshotKind) -> Option<T> {
        for name in kind.file_names(asset) {
            if let Some(value) = read_json_if_exists(&self.data_dir.join(name)).await {
                return Some(value);
            }
        }
        None
    }

    pub fn history(&self) -> HistoryLog {
        HistoryLog::new(self.data_dir.clone())
    }
}

/// Newest-first bounded log of completed cycles, one file per asset
#[derive(Debug, Clone)]
pub struct HistoryLog {
    data_dir: PathBuf,
    cap: usize,
}

impl HistoryLog {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self::with_cap(data_dir, HISTORY_CAP)
    }

    pub fn with_cap(data_dir: impl Into<PathBuf>, cap: usize) -> Self {
        Self {
            data_dir: data_dir.into(),
            cap,
        }
    }

    fn path(&self, asset: &Asset) -> PathBuf {
        self.data_dir.join(format!("{}_history.json", asset.id()))
    }

    /// Prepend `entry`, evicting the oldest entries beyond the cap
    pub async fn append(&self, asset: &Asset, entry: HistoryEntry) -> Result<usize> {
        let mut entries = self.load(asset).await;
        entries.insert(0, entry);
        entries.truncate(self.cap);

        fs::create_dir_all(&self.data_dir)
            .await
            .with_context(|| format!("Failed to create data dir {}", self.data_dir.display()))?;
        write_json_atomic(&self.path(asset), &entries).await?;
        Ok(entries.len())
    }

    pub async fn load(&self, asset: &Asset) -> Vec<HistoryEntry> {
        read_json_if_exists(&self.path(asset)).await.unwrap_or_default()
    }
}

/// Absent or malformed files read as `None`; malformed ones are logged
pub async fn read_json_if_exists<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let raw = match fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to read snapshot file");
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Ignoring malformed snapshot file");
            None
        }
    }
}

/// Serialize as pretty JSON to `<path>.tmp` then rename over `path`
pub async fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize snapshot")?;

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    fs::write(&tmp_path, json)
        .await
        .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path)
        .await
        .with_context(|| format!("Failed to move snapshot into place at {}", path.display()))?;

    tracing::debug!(path = %path.display(), "Wrote snapshot file");
    Ok(())
}
