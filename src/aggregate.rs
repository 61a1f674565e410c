// src/aggregate.rs
//! Pure mapping from oracle verdicts to the confirmed articles worth
//! alerting on. No I/O, suitable for unit tests and offline evaluation.

use crate::classify::Verdict;
use crate::ingest::types::Article;

/// Minimum oracle confidence (0-100) for a confirmed verdict to count.
pub const CONFIDENCE_FLOOR: u8 = 80;

/// Keep verdicts with `confirmed && confidence >= 80` and map their
/// batch-local ordinals back to the batch, preserving verdict order.
pub fn confirmed_articles(batch: &[Article], verdicts: &[Verdict]) -> Vec<Article> {
    let mut out = Vec::new();
    for v in verdicts {
        if !v.confirmed || v.confidence < CONFIDENCE_FLOOR {
            continue;
        }
        match batch.get(v.id) {
            Some(article) => out.push(article.clone()),
            None => tracing::warn!(ordinal = v.id, "verdict ordinal out of range"),
        }
    }
    out
}
