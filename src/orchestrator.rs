// src/orchestrator.rs
//! One monitoring cycle: ingest -> classify -> aggregate -> dispatch ->
//! track. Every internal failure is logged and absorbed; a failed cycle
//! never crashes the process, and Seen Set updates made before a failure
//! stand (partial progress is final, not rolled back).

use std::sync::Arc;

use metrics::counter;

use crate::aggregate;
use crate::classify::ClassifyGateway;
use crate::dedup::SeenSet;
use crate::ingest::{self, types::ChannelSource};
use crate::notify::{self, Notifier};
use crate::relevance::RelevanceFilter;
use crate::retry::AlertTracker;

/// Per-cycle outcome, returned to the command surface.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct CycleReport {
    pub channel: String,
    pub batch: usize,
    pub confirmed: usize,
    pub dispatched: bool,
}

pub struct CycleEngine {
    source: Arc<dyn ChannelSource>,
    gateway: ClassifyGateway,
    notifier: Arc<dyn Notifier>,
    tracker: AlertTracker,
    seen: SeenSet,
    filter: Arc<RelevanceFilter>,
    channels: Vec<String>,
}

impl CycleEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source: Arc<dyn ChannelSource>,
        gateway: ClassifyGateway,
        notifier: Arc<dyn Notifier>,
        tracker: AlertTracker,
        seen: SeenSet,
        filter: Arc<RelevanceFilter>,
        channels: Vec<String>,
    ) -> Self {
        Self {
            source,
            gateway,
            notifier,
            tracker,
            seen,
            filter,
            channels,
        }
    }

    pub fn tracker(&self) -> &AlertTracker {
        &self.tracker
    }

    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    /// Resolve a selector to a concrete channel: an index into the
    /// configured list, or a literal channel name.
    pub fn resolve_channel(&self, selector: &str) -> Option<String> {
        let selector = selector.trim();
        if selector.is_empty() {
            return None;
        }
        if let Ok(idx) = selector.parse::<usize>() {
            return self.channels.get(idx).cloned();
        }
        Some(selector.to_string())
    }

    /// Run one cycle for the selected channel. Safe to invoke concurrently:
    /// the Seen Set is monotone and alert activation is check-and-create.
    pub async fn run_cycle(&self, selector: &str) -> CycleReport {
        let Some(channel) = self.resolve_channel(selector) else {
            tracing::warn!(selector, "channel selector resolved to nothing");
            return CycleReport::default();
        };
        let mut report = CycleReport {
            channel: channel.clone(),
            ..Default::default()
        };

        let batch = match ingest::collect(
            self.source.as_ref(),
            &channel,
            &self.seen,
            &self.filter,
        )
        .await
        {
            Ok(batch) => batch,
            Err(e) => {
                counter!("cycle_errors_total").increment(1);
                tracing::warn!(channel = %channel, error = %e, "ingest failed, ending cycle");
                return report;
            }
        };
        report.batch = batch.len();
        if batch.is_empty() {
            tracing::info!(channel = %channel, "no new relevant messages this cycle");
            return report;
        }

        let verdicts = match self.gateway.classify(&batch).await {
            Ok(verdicts) => verdicts,
            Err(e) => {
                counter!("cycle_errors_total").increment(1);
                tracing::warn!(channel = %channel, error = %e, "no verdicts available this cycle");
                return report;
            }
        };

        let confirmed = aggregate::confirmed_articles(&batch, &verdicts);
        report.confirmed = confirmed.len();
        if confirmed.is_empty() {
            tracing::info!(
                channel = %channel,
                batch = batch.len(),
                "nothing confirmed above the confidence floor"
            );
            return report;
        }

        // Dispatch, then start the retry chain whether or not the first
        // push landed; the retries compensate for delivery failures.
        report.dispatched = notify::dispatch(self.notifier.as_ref(), &confirmed).await;
        let alert_id = confirmed[0].id.to_string();
        self.tracker.activate(&alert_id, confirmed);

        report
    }
}
