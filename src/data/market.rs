use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;

use super::{compute_indicators, sample, Asset, Candle, DataError, DataResult, IndicatorSet, PriceSnapshot};
use crate::config::Config;

/// Hourly bars requested per cycle
pub const HISTORY_LIMIT: u32 = 100;

/// CryptoCompare histohour bar
#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct HistoHourBar {
    time: i64, // Unix seconds
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(rename = "volumefrom")]
    volume_from: f64,
    #[serde(rename = "volumeto", default)]
    volume_to: f64,
}

#[derive(Debug, Deserialize)]
struct HistoHourData {
    #[serde(rename = "Data", default)]
    bars: Vec<HistoHourBar>,
}

/// CoinGecko `simple/price` entry for one coin
#[derive(Debug, Deserialize)]
struct SimplePrice {
    usd: Option<f64>,
    usd_24h_change: Option<f64>,
    usd_24h_vol: Option<f64>,
    usd_market_cap: Option<f64>,
    last_updated_at: Option<i64>,
}

/// CoinGecko id for a tracked asset
fn coingecko_id(asset: &Asset) -> Option<&'static str> {
    match asset.id() {
        "bitcoin" => Some("bitcoin"),
        "ethereum" => Some("ethereum"),
        _ => None,
    }
}

fn build_http_client(timeout_seconds: u64) -> DataResult<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .user_agent(concat!("coinpulse/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// Spot price fetcher (CoinGecko)
pub struct PriceClient {
    client: reqwest::Client,
    base_url: String,
}

impl PriceClient {
    pub fn new(config: &Config) -> DataResult<Self> {
        Ok(Self {
            client: build_http_client(config.feeds.timeout_seconds)?,
            base_url: config.apis.coingecko_base_url.clone(),
        })
    }

    /// Latest price snapshot, or `None` on any failure or unknown asset
    pub async fn fetch_price(&self, asset: &Asset) -> Option<PriceSnapshot> {
        let Some(coin_id) = coingecko_id(asset) else {
            tracing::warn!(asset = %asset, "No price id mapped for asset");
            return None;
        };

        match self.request_price(coin_id).await {
            Ok(snapshot) => {
                tracing::info!(asset = %asset, price = snapshot.current_price, "Fetched price");
                Some(snapshot)
            }
            Err(e) => {
                tracing::error!(asset = %asset, error = %e, "Error fetching price data");
                None
            }
        }
    }

    async fn request_price(&self, coin_id: &str) -> DataResult<PriceSnapshot> {
        let response = self
            .client
            .get(format!("{}/simple/price", self.base_url))
            .query(&[
                ("ids", coin_id),
                ("vs_currencies", "usd"),
                ("include_24hr_change", "true"),
                ("include_market_cap", "true"),
                ("include_24hr_vol", "true"),
                ("include_last_updated_at", "true"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status_code = response.status().as_u16();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(DataError::api_error(status_code, format!("CoinGecko: {}", error_text)));
        }

        let payload: serde_json::Value = response.json().await?;
        parse_price_payload(coin_id, &payload)
    }
}

/// Map a CoinGecko `simple/price` payload to a snapshot
pub fn parse_price_payload(coin_id: &str, payload: &serde_json::Value) -> DataResult<PriceSnapshot> {
    let entry = payload
        .get(coin_id)
        .ok_or_else(|| DataError::no_data(coin_id, "coingecko"))?;
    let price: SimplePrice = serde_json::from_value(entry.clone())?;

    let current_price = price
        .usd
        .ok_or_else(|| DataError::parse_error(format!("missing usd price for {}", coin_id)))?;

    let last_updated = price
        .last_updated_at
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .unwrap_or_else(Utc::now);

    Ok(PriceSnapshot {
        current_price,
        price_change_percentage_24h: price.usd_24h_change,
        market_cap: price.usd_market_cap,
        total_volume: price.usd_24h_vol,
        last_updated,
    })
}

/// Historical OHLC fetcher (CryptoCompare hourly) feeding the indicator calculator
pub struct HistoryClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    allow_synthetic: bool,
}

impl HistoryClient {
    pub fn new(config: &Config) -> DataResult<Self> {
        Ok(Self {
            client: build_http_client(config.feeds.timeout_seconds)?,
            base_url: config.apis.cryptocompare_base_url.clone(),
            api_key: config.apis.cryptocompare_api_key.clone(),
            allow_synthetic: config.pipeline.allow_sample_data,
        })
    }

    /// Fetch hourly candles, oldest first
    pub async fn fetch_history(&self, asset: &Asset, limit: u32) -> DataResult<Vec<Candle>> {
        let limit = limit.to_string();
        let symbol = asset.symbol();
        let mut params = vec![
            ("fsym", symbol.as_str()),
            ("tsym", "USD"),
            ("limit", limit.as_str()),
            ("aggregate", "1"),
        ];
        if let Some(key) = &self.api_key {
            params.push(("api_key", key.as_str()));
        }

        let response = self
            .client
            .get(format!("{}/v2/histohour", self.base_url))
            .query(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(DataError::api_error(
                response.status().as_u16(),
                "CryptoCompare histohour request failed",
            ));
        }

        let payload: serde_json::Value = response.json().await?;
        let candles = parse_histohour(&payload)?;
        if candles.is_empty() {
            return Err(DataError::no_data(asset.id(), "cryptocompare"));
        }

        tracing::debug!(asset = %asset, bars = candles.len(), "Fetched hourly history");
        Ok(candles)
    }

    /// Indicators over the latest hourly window. `None` when history is unavailable
    /// and synthetic data is not allowed.
    pub async fn analyze(&self, asset: &Asset) -> Option<IndicatorSet> {
        let candles = match self.fetch_history(asset, HISTORY_LIMIT).await {
            Ok(candles) => candles,
            Err(e) if self.allow_synthetic => {
                tracing::warn!(
                    asset = %asset,
                    error = %e,
                    "History unavailable, using synthetic series (not authoritative)"
                );
                sample::synthetic_candles(asset, HISTORY_LIMIT as usize)
            }
            Err(e) => {
                tracing::error!(asset = %asset, error = %e, "Error fetching historical data");
                return None;
            }
        };

        compute_indicators(asset.id(), &candles)
    }
}

/// Map a CryptoCompare histohour payload to candles. Zero-close padding bars are dropped.
pub fn parse_histohour(payload: &serde_json::Value) -> DataResult<Vec<Candle>> {
    if payload["Response"].as_str() == Some("Error") {
        let message = payload["Message"].as_str().unwrap_or("API Error");
        return Err(DataError::api_error(200, format!("CryptoCompare: {}", message)));
    }

    let data: HistoHourData = serde_json::from_value(payload["Data"].clone())?;

    let mut candles = Vec::with_capacity(data.bars.len());
    for bar in data.bars {
        if bar.close <= 0.0 {
            continue;
        }
        let time = DateTime::from_timestamp(bar.time, 0)
            .ok_or_else(|| DataError::parse_error(format!("Invalid timestamp: {}", bar.time)))?;
        candles.push(Candle {
            time,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume_from,
        });
    }

    Ok(candles)
}
