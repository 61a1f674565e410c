// src/ingest/types.rs
use anyhow::Result;
use chrono::{DateTime, Utc};

/// One raw message as returned by the channel gateway.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct RawMessage {
    pub id: i64,
    pub date: i64, // unix seconds
    #[serde(default)]
    pub message: String,
}

/// Normalized candidate record considered for alerting.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct Article {
    pub id: i64,
    pub publisher: String, // e.g. "Telegram: Middle_East_Spectator"
    pub title: String,     // truncated excerpt of the body
    pub summary: String,   // full body text
    pub link: String,
    pub published_at: DateTime<Utc>,
}

/// Channel-history reader. The engine never holds a messaging session
/// itself; connectivity belongs to the source.
#[async_trait::async_trait]
pub trait ChannelSource: Send + Sync {
    async fn fetch_recent(&self, channel: &str, limit: usize) -> Result<Vec<RawMessage>>;
    async fn is_connected(&self) -> bool;
    async fn reconnect(&self) -> Result<()>;
    fn name(&self) -> &'static str;
}
