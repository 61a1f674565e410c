// src/retry.rs
//! Acknowledge-or-retry lifecycle for dispatched alerts.
//!
//! One state machine per alert id: `ABSENT -> ACTIVE(n) -> ABSENT`. A tracked
//! alert is re-dispatched on a fixed interval until an operator acknowledges
//! it or the retry ceiling is reached. Cancellation is logical: every tick
//! body re-checks that the alert is still tracked, so an acknowledgment that
//! races a tick always wins.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use metrics::gauge;
use tokio::task::JoinHandle;

use crate::ingest::types::Article;
use crate::notify::{self, Notifier};

pub const RETRY_INTERVAL: Duration = Duration::from_secs(120);
pub const MAX_RETRIES: u32 = 3;

/// Inspection view of one tracked alert.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct PendingAlert {
    pub alert_id: String,
    pub retry_count: u32,
}

struct AlertRecord {
    articles: Vec<Article>,
    retry_count: u32,
    task: Option<JoinHandle<()>>,
}

/// Tracks at most one retry chain per alert id. The table is guarded by a
/// plain mutex; no lock is ever held across a suspension point.
#[derive(Clone)]
pub struct AlertTracker {
    inner: Arc<Mutex<HashMap<String, AlertRecord>>>,
    notifier: Arc<dyn Notifier>,
    interval: Duration,
    max_retries: u32,
}

impl AlertTracker {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self::with_policy(notifier, RETRY_INTERVAL, MAX_RETRIES)
    }

    pub fn with_policy(notifier: Arc<dyn Notifier>, interval: Duration, max_retries: u32) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            notifier,
            interval,
            max_retries,
        }
    }

    /// `ABSENT -> ACTIVE(0)`. The check-and-create is a single critical
    /// section, so two concurrent confirmations of the same id cannot spawn
    /// two retry chains. Returns `false` for a duplicate activation.
    pub fn activate(&self, alert_id: &str, articles: Vec<Article>) -> bool {
        let mut guard = self.inner.lock().expect("alert table poisoned");
        if guard.contains_key(alert_id) {
            tracing::info!(alert_id, "alert already tracked, duplicate activation ignored");
            return false;
        }
        let task = tokio::spawn(Self::run_retries(self.clone(), alert_id.to_string()));
        guard.insert(
            alert_id.to_string(),
            AlertRecord {
                articles,
                retry_count: 0,
                task: Some(task),
            },
        );
        gauge!("alerts_tracked").set(guard.len() as f64);
        true
    }

    /// `ACTIVE(n) -> ABSENT` on operator acknowledgment, at any `n`.
    /// Returns `false` when the id is not tracked (reported as "not found"
    /// by callers, not an error).
    pub fn acknowledge(&self, alert_id: &str) -> bool {
        let record = {
            let mut guard = self.inner.lock().expect("alert table poisoned");
            let removed = guard.remove(alert_id);
            gauge!("alerts_tracked").set(guard.len() as f64);
            removed
        };
        match record {
            Some(rec) => {
                // Abort a sleeping tick right away; a tick already past the
                // sleep exits at its liveness re-check instead.
                if let Some(task) = rec.task {
                    task.abort();
                }
                tracing::info!(alert_id, "alert acknowledged, retries cancelled");
                true
            }
            None => false,
        }
    }

    /// Currently tracked alert ids with their retry counts.
    pub fn pending(&self) -> Vec<PendingAlert> {
        let guard = self.inner.lock().expect("alert table poisoned");
        let mut out: Vec<PendingAlert> = guard
            .iter()
            .map(|(id, rec)| PendingAlert {
                alert_id: id.clone(),
                retry_count: rec.retry_count,
            })
            .collect();
        out.sort_by(|a, b| a.alert_id.cmp(&b.alert_id));
        out
    }

    pub fn is_tracked(&self, alert_id: &str) -> bool {
        self.inner
            .lock()
            .expect("alert table poisoned")
            .contains_key(alert_id)
    }

    async fn run_retries(self, alert_id: String) {
        loop {
            tokio::time::sleep(self.interval).await;

            // Liveness gate: the record may have been acknowledged while
            // this tick slept.
            let articles = {
                let mut guard = self.inner.lock().expect("alert table poisoned");
                let Some(record) = guard.get_mut(&alert_id) else {
                    return;
                };
                if record.retry_count >= self.max_retries {
                    guard.remove(&alert_id);
                    gauge!("alerts_tracked").set(guard.len() as f64);
                    tracing::warn!(
                        alert_id = %alert_id,
                        ceiling = self.max_retries,
                        "retry ceiling reached, dropping unacknowledged alert"
                    );
                    return;
                }
                record.articles.clone()
            };

            // No lock across the send.
            notify::dispatch(self.notifier.as_ref(), &articles).await;

            // Re-check after the send: an acknowledgment that raced the
            // dispatch wins, and the persisted count must not move.
            let mut guard = self.inner.lock().expect("alert table poisoned");
            match guard.get_mut(&alert_id) {
                Some(record) => {
                    record.retry_count += 1;
                    tracing::info!(
                        alert_id = %alert_id,
                        retry = record.retry_count,
                        "alert re-dispatched"
                    );
                }
                None => return,
            }
        }
    }
}
