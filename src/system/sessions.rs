// Session provider capability
// One interface, a live gateway implementation and a static fixture implementation

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration as StdDuration;
use tracing::{debug, info};

use crate::config::{SessionConfig, SessionProviderKind};

/// Sessions active within this many minutes are listed
const ACTIVE_WINDOW_MINUTES: u32 = 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub key: String,
    pub kind: String,
    pub channel: String,
    pub label: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<u64>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_activity: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMessage {
    pub role: String,
    pub content: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionHistory {
    #[serde(default)]
    pub messages: Vec<SessionMessage>,
}

#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn active_sessions(&self) -> Result<Vec<Session>>;
    async fn session_history(&self, key: &str, limit: usize) -> Result<SessionHistory>;
}

/// Build the provider selected by `SESSION_PROVIDER`
pub fn from_config(config: &SessionConfig, timeout_seconds: u64) -> Result<Box<dyn SessionProvider>> {
    match config.provider {
        SessionProviderKind::Live => {
            let Some(url) = &config.gateway_url else {
                bail!("SESSION_GATEWAY_URL is required for the live session provider");
            };
            info!(gateway = %url, "Using live session provider");
            Ok(Box::new(LiveSessionProvider::new(url, timeout_seconds)?))
        }
        SessionProviderKind::Fixture => {
            info!("Using fixture session provider");
            Ok(Box::new(FixtureSessionProvider::new()))
        }
    }
}

/// Gateway-backed provider
pub struct LiveSessionProvider {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct SessionList {
    #[serde(default)]
    sessions: Vec<Session>,
}

impl LiveSessionProvider {
    pub fn new(base_url: &str, timeout_seconds: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(StdDuration::from_secs(timeout_seconds))
            .build()
            .context("Failed to build session gateway client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .with_context(|| format!("Session gateway request failed: {}", url))?;

        let status = response.status();
        if !status.is_success() {
            bail!("Session gateway returned {} for {}", status, url);
        }

        response
            .json()
            .await
            .with_context(|| format!("Invalid session gateway payload from {}", url))
    }
}

#[async_trait]
impl SessionProvider for LiveSessionProvider {
    async fn active_sessions(&self) -> Result<Vec<Session>> {
        let list: SessionList = self
            .get_json("/sessions", &[("activeMinutes", ACTIVE_WINDOW_MINUTES.to_string())])
            .await?;
        debug!(count = list.sessions.len(), "Fetched active sessions");
        Ok(list.sessions)
    }

    async fn session_history(&self, key: &str, limit: usize) -> Result<SessionHistory> {
        let path = format!("/sessions/{}/history", url_segment(key));
        self.get_json(&path, &[("limit", limit.to_string())]).await
    }
}

fn url_segment(raw: &str) -> String {
    raw.bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => (b as char).to_string(),
            _ => format!("%{:02X}", b),
        })
        .collect()
}

/// Static sessions for tests and offline runs
#[derive(Debug, Clone)]
pub struct FixtureSessionProvider {
    sessions: Vec<Session>,
}

impl Default for FixtureSessionProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl FixtureSessionProvider {
    pub fn new() -> Self {
        let now = Utc::now();
        Self::with_sessions(vec![
            Session {
                key: "agent:main:main".to_string(),
                kind: "main".to_string(),
                channel: "webchat".to_string(),
                label: "Main session".to_string(),
                status: "active".to_string(),
                tokens: Some(12_000),
                last_activity: truncate_millis(now - Duration::seconds(30)),
                context: Some("Realtime task dashboard".to_string()),
            },
            Session {
                key: "agent:main:subagent:analysis".to_string(),
                kind: "subagent".to_string(),
                channel: "webchat".to_string(),
                label: "Data analysis task".to_string(),
                status: "active".to_string(),
                tokens: Some(6_500),
                last_activity: truncate_millis(now - Duration::seconds(90)),
                context: Some("Performance analysis and history".to_string()),
            },
        ])
    }

    pub fn with_sessions(sessions: Vec<Session>) -> Self {
        Self { sessions }
    }
}

#[async_trait]
impl SessionProvider for FixtureSessionProvider {
    async fn active_sessions(&self) -> Result<Vec<Session>> {
        Ok(self.sessions.clone())
    }

    async fn session_history(&self, key: &str, _limit: usize) -> Result<SessionHistory> {
        if !self.sessions.iter().any(|s| s.key == key) {
            bail!("Unknown session: {}", key);
        }
        Ok(SessionHistory::default())
    }
}

fn truncate_millis(ts: DateTime<Utc>) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ts.timestamp_millis())
        .single()
        .unwrap_or(ts)
}
