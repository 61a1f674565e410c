// src/ingest/mod.rs
pub mod providers;
pub mod scheduler;
pub mod types;

use chrono::{DateTime, Duration, Utc};
use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;

use crate::dedup::{self, SeenSet};
use crate::ingest::types::{Article, ChannelSource, RawMessage};
use crate::relevance::RelevanceFilter;

/// Backstop against unbounded history scans, not a completeness guarantee.
pub const FETCH_LIMIT: usize = 20;

/// Messages older than this are never resurrected, e.g. after downtime.
pub const WINDOW_HOURS: i64 = 12;

/// Max headline length derived from the body.
const TITLE_CHARS: usize = 120;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_fetched_total", "Raw messages fetched from the source.");
        describe_counter!("ingest_stale_total", "Messages dropped by the time window.");
        describe_counter!("ingest_seen_total", "Messages skipped as already evaluated.");
        describe_counter!(
            "ingest_irrelevant_total",
            "Messages failing the keyword pre-filter."
        );
        describe_counter!("ingest_kept_total", "Messages kept for classification.");
        describe_gauge!("ingest_last_run_ts", "Unix ts when ingest last ran.");
    });
}

/// Derive a short headline from the body text.
pub fn headline(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= TITLE_CHARS {
        return trimmed.to_string();
    }
    let mut out: String = trimmed.chars().take(TITLE_CHARS).collect();
    out.push('…');
    out
}

/// Map one raw gateway message into the uniform candidate shape.
pub fn normalize(channel: &str, msg: &RawMessage) -> Option<Article> {
    let published_at = DateTime::<Utc>::from_timestamp(msg.date, 0)?;
    Some(Article {
        id: msg.id,
        publisher: format!("Telegram: {channel}"),
        title: headline(&msg.message),
        summary: msg.message.trim().to_string(),
        link: format!("https://t.me/{channel}/{}", msg.id),
        published_at,
    })
}

/// Pure windowing core: empty-body drop, time bound, novelty filter,
/// relevance gate. Marks fingerprints seen for relevant AND irrelevant
/// records so stale content is never re-filtered on later cycles.
pub fn window_batch(
    now: DateTime<Utc>,
    channel: &str,
    raw: Vec<RawMessage>,
    seen: &SeenSet,
    filter: &RelevanceFilter,
    window: Duration,
) -> Vec<Article> {
    let mut batch = Vec::new();

    for msg in raw {
        if msg.message.trim().is_empty() {
            continue;
        }
        let Some(article) = normalize(channel, &msg) else {
            continue;
        };
        if now.signed_duration_since(article.published_at) > window {
            counter!("ingest_stale_total").increment(1);
            continue;
        }

        let fp = dedup::fingerprint(&article);
        if seen.contains(&fp) {
            counter!("ingest_seen_total").increment(1);
            continue;
        }
        if !filter.is_relevant(&article) {
            seen.insert(&fp);
            counter!("ingest_irrelevant_total").increment(1);
            continue;
        }

        seen.insert(&fp);
        batch.push(article);
    }

    // Oldest first, so downstream verdicts and alerts read chronologically.
    batch.sort_by_key(|a| a.published_at);
    batch
}

/// Collect the batch of new, relevant articles for one channel.
pub async fn collect(
    source: &dyn ChannelSource,
    channel: &str,
    seen: &SeenSet,
    filter: &RelevanceFilter,
) -> anyhow::Result<Vec<Article>> {
    ensure_metrics_described();

    let raw = source.fetch_recent(channel, FETCH_LIMIT).await?;
    counter!("ingest_fetched_total").increment(raw.len() as u64);

    let now = Utc::now();
    let batch = window_batch(now, channel, raw, seen, filter, Duration::hours(WINDOW_HOURS));

    counter!("ingest_kept_total").increment(batch.len() as u64);
    gauge!("ingest_last_run_ts").set(now.timestamp() as f64);

    Ok(batch)
}
