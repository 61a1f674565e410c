// src/config.rs
//! Process configuration from environment variables (`.env` honored in dev
//! via dotenvy at startup). Collaborator credentials stay inside their own
//! adapters; only orchestration knobs live here.

pub const DEFAULT_CHANNELS: &[&str] = &["Middle_East_Spectator", "DefenderDome"];

const DEFAULT_POLL_INTERVAL_SECS: u64 = 300;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub channels: Vec<String>,
    pub poll_enabled: bool,
    pub poll_interval_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let channels = std::env::var("MONITOR_CHANNELS")
            .ok()
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_CHANNELS.iter().map(|s| s.to_string()).collect());

        let poll_enabled = std::env::var("POLL_ENABLED").ok().as_deref() == Some("1");
        let poll_interval_secs = std::env::var("POLL_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_POLL_INTERVAL_SECS);

        Self {
            channels,
            poll_enabled,
            poll_interval_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[serial_test::serial]
    #[test]
    fn defaults_apply_without_env() {
        env::remove_var("MONITOR_CHANNELS");
        env::remove_var("POLL_ENABLED");
        env::remove_var("POLL_INTERVAL_SECS");

        let cfg = AppConfig::from_env();
        assert_eq!(cfg.channels, DEFAULT_CHANNELS);
        assert!(!cfg.poll_enabled);
        assert_eq!(cfg.poll_interval_secs, DEFAULT_POLL_INTERVAL_SECS);
    }

    #[serial_test::serial]
    #[test]
    fn env_overrides_and_trims() {
        env::set_var("MONITOR_CHANNELS", " alpha , ,beta ");
        env::set_var("POLL_ENABLED", "1");
        env::set_var("POLL_INTERVAL_SECS", "60");

        let cfg = AppConfig::from_env();
        assert_eq!(cfg.channels, vec!["alpha".to_string(), "beta".to_string()]);
        assert!(cfg.poll_enabled);
        assert_eq!(cfg.poll_interval_secs, 60);

        env::remove_var("MONITOR_CHANNELS");
        env::remove_var("POLL_ENABLED");
        env::remove_var("POLL_INTERVAL_SECS");
    }
}
