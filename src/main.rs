//! Escalation Alert Engine — Binary Entrypoint
//! Boots the Axum command surface, wiring shared state and background jobs.

use std::sync::Arc;

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use escalation_alert_engine::classify::{ClassifyGateway, GeminiOracle};
use escalation_alert_engine::config::AppConfig;
use escalation_alert_engine::dedup::SeenSet;
use escalation_alert_engine::ingest::providers::telegram_bridge::TelegramBridge;
use escalation_alert_engine::ingest::scheduler::{spawn_poll_scheduler, PollSchedulerCfg};
use escalation_alert_engine::ingest::types::ChannelSource;
use escalation_alert_engine::metrics::Metrics;
use escalation_alert_engine::notify::fcm::FcmNotifier;
use escalation_alert_engine::notify::Notifier;
use escalation_alert_engine::relevance::RelevanceFilter;
use escalation_alert_engine::retry::AlertTracker;
use escalation_alert_engine::{api, CycleEngine};

/// Enable compact tracing logs in development only.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - ALERT_DEV_LOG=1
fn enable_dev_tracing() {
    let dev_flag = std::env::var("ALERT_DEV_LOG").ok().is_some_and(|v| v == "1");

    let is_dev_env = cfg!(debug_assertions)
        || matches!(
            std::env::var("SHUTTLE_ENV")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "local" | "development" | "dev"
        );

    if !(dev_flag && is_dev_env) {
        return;
    }

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("escalation_alert_engine=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments. This enables
    // KEYWORDS_CONFIG_PATH / MONITOR_CHANNELS / collaborator keys from .env.
    let _ = dotenvy::dotenv();

    // Initialize dev tracing early (no-op in production).
    enable_dev_tracing();

    let cfg = AppConfig::from_env();
    let filter = RelevanceFilter::from_toml().expect("Failed to load keyword config");

    // Collaborators behind their trait seams.
    let source: Arc<dyn ChannelSource> = Arc::new(TelegramBridge::from_env());
    let notifier: Arc<dyn Notifier> = Arc::new(FcmNotifier::from_env());
    let gateway = ClassifyGateway::new(Arc::new(GeminiOracle::from_env()));

    let tracker = AlertTracker::new(notifier.clone());
    let engine = Arc::new(CycleEngine::new(
        source,
        gateway,
        notifier,
        tracker,
        SeenSet::new(),
        Arc::new(filter),
        cfg.channels.clone(),
    ));

    if cfg.poll_enabled {
        spawn_poll_scheduler(
            engine.clone(),
            PollSchedulerCfg {
                interval_secs: cfg.poll_interval_secs,
            },
        );
    }

    let metrics = Metrics::init();
    let state = api::AppState { engine };
    let router = api::create_router(state).merge(metrics.router());

    Ok(router.into())
}
