use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Shortest scheduler interval accepted, in seconds
pub const MIN_INTERVAL_SECONDS: u64 = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub apis: ApiConfig,
    pub feeds: FeedConfig,
    pub pipeline: PipelineConfig,
    pub sessions: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub news_api_key: Option<String>,
    pub cryptocompare_api_key: Option<String>,
    pub newsapi_base_url: String,
    pub coingecko_base_url: String,
    pub cryptocompare_base_url: String,
}

/// An RSS feed to pull headlines from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedSource {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    pub sources: Vec<FeedSource>,
    pub max_articles: usize,
    /// Per-request HTTP timeout shared by every fetcher
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub data_dir: PathBuf,
    pub coins: Vec<String>,
    pub allow_sample_data: bool,
    pub scrape_interval_seconds: u64,
    pub price_interval_seconds: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionProviderKind {
    Live,
    Fixture,
}

impl FromStr for SessionProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "live" => Ok(SessionProviderKind::Live),
            "fixture" => Ok(SessionProviderKind::Fixture),
            other => bail!("unknown session provider '{}' (use live or fixture)", other),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub provider: SessionProviderKind,
    pub gateway_url: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load .env file - this sets env vars that aren't already set
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup (the environment in production)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let sources = match non_empty("NEWS_FEEDS") {
            Some(raw) => parse_feed_list(&raw).context("Invalid NEWS_FEEDS value")?,
            None => defaults.feeds.sources,
        };

        let coins: Vec<String> = non_empty("SCRAPE_COINS")
            .map(|raw| {
                raw.split(',')
                    .map(|c| c.trim().to_lowercase())
                    .filter(|c| !c.is_empty())
                    .collect()
            })
            .unwrap_or(defaults.pipeline.coins);
        if coins.is_empty() {
            bail!("SCRAPE_COINS must name at least one asset");
        }

        let scrape_interval_seconds: u64 =
            parse_or(&lookup, "SCRAPE_INTERVAL_SECONDS", defaults.pipeline.scrape_interval_seconds)?;
        let price_interval_seconds: u64 =
            parse_or(&lookup, "PRICE_INTERVAL_SECONDS", defaults.pipeline.price_interval_seconds)?;
        for (key, value) in [
            ("SCRAPE_INTERVAL_SECONDS", scrape_interval_seconds),
            ("PRICE_INTERVAL_SECONDS", price_interval_seconds),
        ] {
            if value < MIN_INTERVAL_SECONDS {
                bail!("{} must be at least {} seconds (got {})", key, MIN_INTERVAL_SECONDS, value);
            }
        }

        let max_articles: usize = parse_or(&lookup, "MAX_ARTICLES", defaults.feeds.max_articles)?;
        if max_articles == 0 {
            bail!("MAX_ARTICLES must be greater than zero");
        }

        let config = Config {
            apis: ApiConfig {
                news_api_key: non_empty("NEWS_API_KEY"),
                cryptocompare_api_key: non_empty("CRYPTOCOMPARE_API_KEY"),
                newsapi_base_url: non_empty("NEWSAPI_BASE_URL")
                    .unwrap_or(defaults.apis.newsapi_base_url),
                coingecko_base_url: non_empty("COINGECKO_BASE_URL")
                    .unwrap_or(defaults.apis.coingecko_base_url),
                cryptocompare_base_url: non_empty("CRYPTOCOMPARE_BASE_URL")
                    .unwrap_or(defaults.apis.cryptocompare_base_url),
            },
            feeds: FeedConfig {
                sources,
                max_articles,
                timeout_seconds: parse_or(&lookup, "HTTP_TIMEOUT_SECONDS", defaults.feeds.timeout_seconds)?,
            },
            pipeline: PipelineConfig {
                data_dir: non_empty("DATA_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.pipeline.data_dir),
                coins,
                allow_sample_data: parse_or(&lookup, "ALLOW_SAMPLE_DATA", false)
                    .context("use true/false")?,
                scrape_interval_seconds,
                price_interval_seconds,
            },
            sessions: SessionConfig {
                provider: match non_empty("SESSION_PROVIDER") {
                    Some(raw) => raw.parse().context("Invalid SESSION_PROVIDER value")?,
                    None => defaults.sessions.provider,
                },
                gateway_url: non_empty("SESSION_GATEWAY_URL"),
            },
        };

        if config.sessions.provider == SessionProviderKind::Live && config.sessions.gateway_url.is_none() {
            bail!("SESSION_GATEWAY_URL is required when SESSION_PROVIDER=live");
        }

        Ok(config)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key).filter(|v| !v.trim().is_empty()) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {} value: {}", key, raw)),
        None => Ok(default),
    }
}

/// Parse `name|url,name|url` into feed sources
pub fn parse_feed_list(raw: &str) -> Result<Vec<FeedSource>> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (name, url) = entry
                .split_once('|')
                .with_context(|| format!("feed entry '{}' must look like name|url", entry))?;
            let (name, url) = (name.trim(), url.trim());
            if name.is_empty() || !(url.starts_with("http://") || url.starts_with("https://")) {
                bail!("feed entry '{}' needs a name and an http(s) url", entry);
            }
            Ok(FeedSource {
                name: name.to_string(),
                url: url.to_string(),
            })
        })
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            apis: ApiConfig {
                news_api_key: None,
                cryptocompare_api_key: None,
                newsapi_base_url: "https://newsapi.org".to_string(),
                coingecko_base_url: "https://api.coingecko.com/api/v3".to_string(),
                cryptocompare_base_url: "https://min-api.cryptocompare.com/data".to_string(),
            },
            feeds: FeedConfig {
                sources: vec![
                    FeedSource {
                        name: "coindesk".to_string(),
                        url: "https://www.coindesk.com/arc/outboundfeeds/rss/".to_string(),
                    },
                    FeedSource {
                        name: "cointelegraph".to_string(),
                        url: "https://cointelegraph.com/rss".to_string(),
                    },
                    FeedSource {
                        name: "decrypt".to_string(),
                        url: "https://decrypt.co/feed".to_string(),
                    },
                ],
                max_articles: 50,
                timeout_seconds: 10,
            },
            pipeline: PipelineConfig {
                data_dir: PathBuf::from("data"),
                coins: vec!["bitcoin".to_string(), "ethereum".to_string()],
                allow_sample_data: false,
                scrape_interval_seconds: 600,
                price_interval_seconds: 30,
            },
            sessions: SessionConfig {
                provider: SessionProviderKind::Fixture,
                gateway_url: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.feeds.max_articles, 50);
        assert_eq!(config.feeds.timeout_seconds, 10);
        assert!(!config.pipeline.allow_sample_data);
        assert_eq!(config.pipeline.coins, vec!["bitcoin", "ethereum"]);
        assert_eq!(config.sessions.provider, SessionProviderKind::Fixture);
        assert_eq!(config.feeds.sources.len(), 3);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("NEWS_API_KEY", "abc"),
            ("MAX_ARTICLES", "25"),
            ("ALLOW_SAMPLE_DATA", "true"),
            ("SCRAPE_COINS", "Bitcoin, ,solana"),
            ("NEWS_FEEDS", "wire|https://wire.example.com/rss, blog | http://blog.example.com/feed"),
            ("DATA_DIR", "/tmp/pulse"),
        ]))
        .unwrap();

        assert_eq!(config.apis.news_api_key.as_deref(), Some("abc"));
        assert_eq!(config.feeds.max_articles, 25);
        assert!(config.pipeline.allow_sample_data);
        assert_eq!(config.pipeline.coins, vec!["bitcoin", "solana"]);
        assert_eq!(config.feeds.sources[1].name, "blog");
        assert_eq!(config.feeds.sources[1].url, "http://blog.example.com/feed");
        assert_eq!(config.pipeline.data_dir, PathBuf::from("/tmp/pulse"));
    }

    #[test]
    fn test_invalid_values_name_the_key() {
        let err = Config::from_lookup(lookup_from(&[("MAX_ARTICLES", "lots")])).unwrap_err();
        assert!(format!("{:#}", err).contains("MAX_ARTICLES"));

        let err = Config::from_lookup(lookup_from(&[("SCRAPE_INTERVAL_SECONDS", "5")])).unwrap_err();
        assert!(err.to_string().contains("SCRAPE_INTERVAL_SECONDS"));

        assert!(Config::from_lookup(lookup_from(&[("ALLOW_SAMPLE_DATA", "yes")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("NEWS_FEEDS", "no-separator")])).is_err());
    }

    #[test]
    fn test_live_sessions_require_gateway() {
        assert!(Config::from_lookup(lookup_from(&[("SESSION_PROVIDER", "live")])).is_err());
        let config = Config::from_lookup(lookup_from(&[
            ("SESSION_PROVIDER", "LIVE"),
            ("SESSION_GATEWAY_URL", "http://localhost:18789"),
        ]))
        .unwrap();
        assert_eq!(config.sessions.provider, SessionProviderKind::Live);
    }
}
