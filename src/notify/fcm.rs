use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;

use super::{AlertPayload, Notifier};

/// Fixed broadcast topic; delivery is not addressed per-device.
pub const TOPIC: &str = "news_alerts_v2";

const FCM_SEND_URL: &str = "https://fcm.googleapis.com/fcm/send";

pub struct FcmNotifier {
    server_key: Option<String>,
    endpoint: String,
    client: Client,
}

impl FcmNotifier {
    pub fn from_env() -> Self {
        Self {
            server_key: std::env::var("FCM_SERVER_KEY").ok(),
            endpoint: FCM_SEND_URL.to_string(),
            client: Client::builder()
                .connect_timeout(Duration::from_secs(4))
                .timeout(Duration::from_secs(10))
                .build()
                .expect("reqwest client"),
        }
    }

    /// Optional builder for tests/tools
    pub fn new(server_key: String) -> Self {
        let mut n = Self::from_env();
        n.server_key = Some(server_key);
        n
    }

    pub fn with_endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = url.into();
        self
    }
}

#[async_trait::async_trait]
impl Notifier for FcmNotifier {
    async fn send(&self, payload: &AlertPayload) -> Result<()> {
        let Some(key) = &self.server_key else {
            tracing::debug!("FCM disabled (no FCM_SERVER_KEY)");
            return Ok(());
        };

        let body = serde_json::json!({
            "to": format!("/topics/{TOPIC}"),
            "android": {
                "notification": {
                    "channel_id": TOPIC,
                    "sound": "alarm",
                }
            },
            "notification": {
                "title": payload.title,
                "body": payload.body,
            },
            "data": {
                "count": payload.count.to_string(),
                "sources": serde_json::to_string(&payload.sources).unwrap_or_default(),
                "articleId": payload.article_id,
            }
        });

        self.client
            .post(&self.endpoint)
            .header("Authorization", format!("key={key}"))
            .json(&body)
            .send()
            .await
            .context("fcm post")?
            .error_for_status()
            .context("fcm non-2xx")?;
        Ok(())
    }
}
