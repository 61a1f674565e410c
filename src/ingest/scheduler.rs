// src/ingest/scheduler.rs
use std::sync::Arc;

use metrics::counter;
use tokio::task::JoinHandle;

use crate::orchestrator::CycleEngine;

#[derive(Clone, Copy, Debug)]
pub struct PollSchedulerCfg {
    pub interval_secs: u64,
}

/// Spawn the background poll loop: one cycle per configured channel per
/// tick. Cycles absorb their own failures, so the loop never dies.
pub fn spawn_poll_scheduler(engine: Arc<CycleEngine>, cfg: PollSchedulerCfg) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(cfg.interval_secs));
        loop {
            ticker.tick().await;
            for idx in 0..engine.channels().len() {
                let report = engine.run_cycle(&idx.to_string()).await;
                tracing::info!(
                    target: "poll",
                    channel = %report.channel,
                    batch = report.batch,
                    confirmed = report.confirmed,
                    "poll cycle"
                );
            }
            counter!("poll_runs_total").increment(1);
        }
    })
}
