//! Live roulette result feed
//!
//! Polls the casino stats endpoint for the latest spin. Network trouble,
//! bad status codes and unrecognized payloads all surface as "no new
//! outcome" so the collector just skips the cycle; the feed never fails
//! the caller for ordinary transport issues.

use crate::config::FeedConfig;
use crate::error::Result;
use crate::types::Spin;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// A source of roulette outcomes.
#[async_trait]
pub trait SpinSource: Send + Sync {
    fn name(&self) -> &str;

    /// The most recent spin, or `None` when the feed is unavailable.
    async fn fetch_latest(&self) -> Option<Spin>;
}

/// HTTP feed client for the casino stats API.
pub struct CasinoFeed {
    http: reqwest::Client,
    url: String,
}

impl CasinoFeed {
    pub fn new(config: &FeedConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent("Mozilla/5.0")
            .build()?;
        Ok(Self {
            http,
            url: config.url.clone(),
        })
    }

    async fn fetch_payload(&self) -> Option<Value> {
        let response = match self.http.get(&self.url).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("feed request failed: {}", e);
                return None;
            }
        };
        if !response.status().is_success() {
            tracing::warn!("feed returned status {}", response.status());
            return None;
        }
        match response.json::<Value>().await {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("feed payload is not JSON: {}", e);
                None
            }
        }
    }

    /// Most recent spins, newest first, up to `limit`.
    pub async fn fetch_recent(&self, limit: usize) -> Vec<Spin> {
        let Some(payload) = self.fetch_payload().await else {
            return Vec::new();
        };
        parse_spins(&payload).into_iter().take(limit).collect()
    }
}

#[async_trait]
impl SpinSource for CasinoFeed {
    fn name(&self) -> &str {
        "casino_feed"
    }

    async fn fetch_latest(&self) -> Option<Spin> {
        let payload = self.fetch_payload().await?;
        parse_latest(&payload)
    }
}

/// Extracts the result number from one feed item. The feed has been seen
/// to serve both a bare number and a nested `{"number": ..}` object, with
/// numbers occasionally arriving as strings.
fn extract_number(item: &Value) -> Option<u8> {
    let result = item.get("result")?;
    let raw = if let Some(n) = result.as_u64() {
        n
    } else if let Some(s) = result.as_str() {
        s.parse().ok()?
    } else {
        result.get("number")?.as_u64()?
    };
    u8::try_from(raw).ok()
}

/// Parses every recognizable spin out of a feed payload, newest first.
/// Accepts both known response shapes: a `data`/`history` list of result
/// objects, or a single nested result object.
fn parse_spins(payload: &Value) -> Vec<Spin> {
    let Some(data) = payload.get("data").or_else(|| payload.get("history")) else {
        return Vec::new();
    };
    match data {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| extract_number(item).and_then(Spin::new))
            .collect(),
        Value::Object(_) => extract_number(data)
            .and_then(Spin::new)
            .into_iter()
            .collect(),
        _ => Vec::new(),
    }
}

fn parse_latest(payload: &Value) -> Option<Spin> {
    parse_spins(payload).into_iter().next()
}
