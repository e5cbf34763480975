use chrono::{DateTime, Utc};
use futures::future::{join_all, BoxFuture, FutureExt};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

use super::{Asset, Category, DataError, DataResult, NewsArticle, SentimentScorer};
use crate::config::{Config, FeedSource};

/// Query params that only carry campaign tracking
const TRACKING_PARAMS: &[&str] = &[
    "fbclid", "gclid", "mc_cid", "mc_eid", "ref", "ref_src", "cmpid", "ocid", "cid",
];

lazy_static! {
    static ref HTML_TAGS: Regex = Regex::new(r"<[^>]*>").expect("static regex");
    static ref SPACES: Regex = Regex::new(r"\s+").expect("static regex");
    static ref SEC: Regex = Regex::new(r"\bsec\b").expect("static regex");
}

/// Entry as read from a provider, before filtering and scoring
#[derive(Debug, Clone, Default)]
pub struct RawEntry {
    pub title: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub author: Option<String>,
    pub published: Option<DateTime<Utc>>,
    pub source: String,
}

pub struct NewsClient {
    http_client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    feeds: Vec<FeedSource>,
    max_articles: usize,
    scorer: SentimentScorer,
}

impl NewsClient {
    pub fn new(config: &Config) -> DataResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.feeds.timeout_seconds))
            .user_agent(concat!("coinpulse/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http_client,
            api_key: config.apis.news_api_key.clone(),
            base_url: config.apis.newsapi_base_url.clone(),
            feeds: config.feeds.sources.clone(),
            max_articles: config.feeds.max_articles,
            scorer: SentimentScorer::new(),
        })
    }

    /// Fetch every configured source concurrently and merge the results.
    /// A failing source is logged and contributes nothing; this never errors.
    pub async fn fetch_news(&self, asset: &Asset) -> Vec<NewsArticle> {
        tracing::info!(asset = %asset, feeds = self.feeds.len(), "Fetching news");

        let mut sources: Vec<(String, BoxFuture<'_, DataResult<Vec<NewsArticle>>>)> = Vec::new();

        if self.api_key.is_some() {
            for query in newsapi_queries(asset) {
                sources.push((
                    format!("newsapi:{}", query),
                    self.fetch_from_newsapi(asset, query).boxed(),
                ));
            }
        } else {
            tracing::debug!("NEWS_API_KEY not configured, skipping NewsAPI");
        }

        for feed in &self.feeds {
            sources.push((feed.name.clone(), self.fetch_feed(asset, feed).boxed()));
        }

        let (labels, futures): (Vec<_>, Vec<_>) = sources.into_iter().unzip();
        let results = join_all(futures).await;

        let mut articles = Vec::new();
        for (label, result) in labels.into_iter().zip(results) {
            match result {
                Ok(batch) => {
                    tracing::debug!(source = %label, count = batch.len(), "News source fetched");
                    articles.extend(batch);
                }
                Err(e) if e.is_retryable() => {
                    tracing::warn!(source = %label, error = %e, "News source temporarily unavailable");
                }
                Err(e) => {
                    tracing::error!(source = %label, error = %e, "News source failed");
                }
            }
        }

        let ranked = dedupe_and_rank(articles, self.max_articles);
        tracing::info!(asset = %asset, count = ranked.len(), "Fetched news articles");
        ranked
    }

    /// Fetch one NewsAPI `everything` query
    async fn fetch_from_newsapi(&self, asset: &Asset, query: String) -> DataResult<Vec<NewsArticle>> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| DataError::Config("NewsAPI key not configured".to_string()))?;

        let page_size = self.max_articles.clamp(1, 100).to_string();
        let response = self
            .http_client
            .get(format!("{}/v2/everything", self.base_url))
            .query(&[
                ("q", query.as_str()),
                ("sortBy", "publishedAt"),
                ("language", "en"),
                ("pageSize", page_size.as_str()),
                ("apiKey", api_key.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(DataError::api_error(status, format!("NewsAPI error: {}", error_text)));
        }

        let payload: serde_json::Value = response.json().await?;
        parse_newsapi_response(asset, &payload, &self.scorer)
    }

    /// Fetch and parse one RSS feed
    async fn fetch_feed(&self, asset: &Asset, feed: &FeedSource) -> DataResult<Vec<NewsArticle>> {
        let response = self.http_client.get(&feed.url).send().await?;

        if !response.status().is_success() {
            return Err(DataError::api_error(
                response.status().as_u16(),
                format!("feed {} returned an error", feed.name),
            ));
        }

        let body = response.bytes().await?;
        parse_rss_feed(asset, &feed.name, &body, &self.scorer)
    }
}

fn newsapi_queries(asset: &Asset) -> Vec<String> {
    let id = asset.id();
    vec![
        id.to_string(),
        format!("{} price", id),
        format!("{} market", id),
    ]
}

/// Map a NewsAPI `everything` payload into filtered articles
pub fn parse_newsapi_response(
    asset: &Asset,
    payload: &serde_json::Value,
    scorer: &SentimentScorer,
) -> DataResult<Vec<NewsArticle>> {
    if payload["status"].as_str() != Some("ok") {
        let message = payload["message"].as_str().unwrap_or("unexpected status");
        return Err(DataError::api_error(200, format!("NewsAPI: {}", message)));
    }

    let entries = payload["articles"]
        .as_array()
        .ok_or_else(|| DataError::parse_error("No articles array in response"))?;

    let articles = entries
        .iter()
        .map(|entry| RawEntry {
            title: entry["title"].as_str().map(String::from),
            url: entry["url"].as_str().map(String::from),
            description: entry["description"].as_str().map(String::from),
            content: entry["content"].as_str().map(String::from),
            author: entry["author"].as_str().map(String::from),
            published: entry["publishedAt"].as_str().and_then(parse_timestamp),
            source: entry["source"]["name"].as_str().unwrap_or("newsapi").to_string(),
        })
        .filter_map(|raw| build_article(asset, raw, scorer))
        .collect();

    Ok(articles)
}

/// Parse an RSS document into filtered articles
pub fn parse_rss_feed(
    asset: &Asset,
    feed_name: &str,
    body: &[u8],
    scorer: &SentimentScorer,
) -> DataResult<Vec<NewsArticle>> {
    let channel = rss::Channel::read_from(body)?;

    let articles = channel
        .items()
        .iter()
        .map(|item| RawEntry {
            title: item.title().map(String::from),
            url: item.link().map(String::from),
            description: item.description().map(String::from),
            content: item.content().map(String::from),
            author: item.author().map(String::from),
            published: item.pub_date().and_then(parse_timestamp),
            source: feed_name.to_string(),
        })
        .filter_map(|raw| build_article(asset, raw, scorer))
        .collect();

    Ok(articles)
}

/// Normalize one entry. Entries missing a title, a usable url or a keyword match are dropped.
pub fn build_article(asset: &Asset, raw: RawEntry, scorer: &SentimentScorer) -> Option<NewsArticle> {
    let title = raw.title.map(|t| strip_html(&t)).filter(|t| !t.is_empty())?;
    let url = raw.url.as_deref().and_then(normalize_url)?;
    let description = raw.description.map(|d| strip_html(&d)).filter(|d| !d.is_empty());
    let content = raw.content.map(|c| strip_html(&c)).unwrap_or_default();

    let haystack = format!(
        "{} {} {}",
        title,
        description.as_deref().unwrap_or(""),
        content
    );
    if !asset.matches(&haystack) {
        return None;
    }

    let sentiment = scorer.score(&haystack);
    let category = categorize(&title, description.as_deref());
    let summary = description
        .clone()
        .unwrap_or_else(|| summarize(if content.is_empty() { &title } else { &content }));

    Some(NewsArticle {
        title,
        source: slugify_source(&raw.source),
        url,
        sentiment,
        summary,
        timestamp: raw.published.unwrap_or_else(Utc::now),
        content,
        author: raw.author.filter(|a| !a.trim().is_empty()),
        category,
        platform: None,
    })
}

/// Dedupe by url keeping the first occurrence, newest first, capped at `max`
pub fn dedupe_and_rank(articles: Vec<NewsArticle>, max: usize) -> Vec<NewsArticle> {
    let mut seen = HashSet::new();
    let mut unique: Vec<NewsArticle> = articles
        .into_iter()
        .filter(|a| seen.insert(a.url.clone()))
        .collect();

    unique.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    unique.truncate(max);
    unique
}

/// Canonical form of an article url: tracking params and fragment removed.
/// Returns `None` for anything that is not an absolute http(s) url.
pub fn normalize_url(raw: &str) -> Option<String> {
    let mut url = Url::parse(raw.trim()).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }

    url.set_fragment(None);

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| {
            let key = key.to_lowercase();
            !key.starts_with("utm_") && !TRACKING_PARAMS.contains(&key.as_str())
        })
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }

    Some(url.to_string())
}

/// Keyword heuristic category
pub fn categorize(title: &str, description: Option<&str>) -> Category {
    let text = format!("{} {}", title, description.unwrap_or("")).to_lowercase();
    let has_any = |words: &[&str]| words.iter().any(|w| text.contains(w));

    if has_any(&["regulation", "regulator", "law", "government"]) || SEC.is_match(&text) {
        Category::Regulation
    } else if has_any(&["price", "market", "trade", "trading", "etf"]) {
        Category::Market
    } else if has_any(&["technology", "update", "upgrade", "development", "network"]) {
        Category::Technology
    } else if has_any(&["adoption", "institutional", "company", "treasury"]) {
        Category::Adoption
    } else {
        Category::General
    }
}

/// First two sentences of the content
pub fn summarize(content: &str) -> String {
    let sentences: Vec<&str> = content
        .split(|c| c == '.' || c == '!' || c == '?')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .take(2)
        .collect();

    if sentences.is_empty() {
        return String::new();
    }
    format!("{}.", sentences.join(". "))
}

/// Source id: lowercase with whitespace runs replaced by `-`
pub fn slugify_source(name: &str) -> String {
    SPACES.replace_all(name.trim(), "-").to_lowercase()
}

fn strip_html(text: &str) -> String {
    let without_tags = HTML_TAGS.replace_all(text, " ");
    SPACES.replace_all(&without_tags, " ").trim().to_string()
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_rfc2822(raw))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}
