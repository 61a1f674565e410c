// src/notify/mod.rs
pub mod fcm;

use crate::ingest::types::Article;

/// Payload summarizing one confirmed batch for broadcast push delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertPayload {
    pub title: String,
    pub body: String,
    pub count: usize,
    pub sources: Vec<String>, // distinct publisher names, first-seen order
    pub article_id: String,   // first confirmed record; downstream tracking key
}

impl AlertPayload {
    /// Build the broadcast payload for a confirmed batch. `None` for an
    /// empty batch (guarded defensively, not assumed impossible).
    pub fn from_articles(articles: &[Article]) -> Option<Self> {
        let first = articles.first()?;
        let mut sources: Vec<String> = Vec::new();
        for a in articles {
            if !sources.contains(&a.publisher) {
                sources.push(a.publisher.clone());
            }
        }
        Some(Self {
            title: "🚨 URGENT: Military Attack Confirmed".to_string(),
            body: format!(
                "{} sources confirmed a military event. Check App immediately.",
                articles.len()
            ),
            count: articles.len(),
            sources,
            article_id: first.id.to_string(),
        })
    }
}

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, payload: &AlertPayload) -> anyhow::Result<()>;
}

/// Send one alert, absorbing delivery failures: the retry lifecycle is the
/// reliability mechanism, not error handling at this layer. Returns whether
/// the send succeeded.
pub async fn dispatch(notifier: &dyn Notifier, articles: &[Article]) -> bool {
    let Some(payload) = AlertPayload::from_articles(articles) else {
        tracing::warn!("dispatch called with an empty batch");
        return false;
    };
    match notifier.send(&payload).await {
        Ok(()) => {
            tracing::info!(
                count = payload.count,
                article_id = %payload.article_id,
                "alert pushed"
            );
            true
        }
        Err(e) => {
            tracing::warn!(error = %e, "alert push failed");
            false
        }
    }
}
