// src/ingest/providers/telegram_bridge.rs
//! HTTP adapter over the Telegram gateway sidecar. The gateway owns the
//! MTProto session; this engine only consumes its JSON surface.

use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;

use crate::ingest::types::{ChannelSource, RawMessage};

pub const DEFAULT_BRIDGE_URL: &str = "http://127.0.0.1:3000";

pub struct TelegramBridge {
    base_url: String,
    http: Client,
}

impl TelegramBridge {
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(15))
            .build()
            .expect("reqwest client");
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        }
    }

    pub fn from_env() -> Self {
        let url =
            std::env::var("TELEGRAM_BRIDGE_URL").unwrap_or_else(|_| DEFAULT_BRIDGE_URL.into());
        Self::new(url)
    }

    async fn try_fetch(&self, channel: &str, limit: usize) -> Result<Vec<RawMessage>> {
        let url = format!("{}/api/messages", self.base_url);
        let resp = self
            .http
            .get(&url)
            .query(&[("channel", channel), ("limit", &limit.to_string())])
            .send()
            .await
            .context("bridge fetch")?
            .error_for_status()
            .context("bridge non-2xx")?;
        let msgs: Vec<RawMessage> = resp.json().await.context("bridge body")?;
        Ok(msgs)
    }
}

#[async_trait::async_trait]
impl ChannelSource for TelegramBridge {
    async fn fetch_recent(&self, channel: &str, limit: usize) -> Result<Vec<RawMessage>> {
        match self.try_fetch(channel, limit).await {
            Ok(msgs) => Ok(msgs),
            Err(e) => {
                // One reconnect attempt, then retry the fetch once.
                tracing::warn!(error = %e, channel, "bridge fetch failed, reconnecting");
                self.reconnect().await?;
                self.try_fetch(channel, limit).await
            }
        }
    }

    async fn is_connected(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        matches!(
            self.http.get(&url).send().await.map(|r| r.status().is_success()),
            Ok(true)
        )
    }

    async fn reconnect(&self) -> Result<()> {
        let url = format!("{}/api/reconnect", self.base_url);
        self.http
            .post(&url)
            .send()
            .await
            .context("bridge reconnect")?
            .error_for_status()
            .context("bridge reconnect non-2xx")?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "telegram-bridge"
    }
}
