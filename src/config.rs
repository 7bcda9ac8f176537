//! Runtime configuration for the state core.
//!
//! The only configurable piece is the optional remote mirror. Everything is
//! read from `PLATEFRONT_*` environment variables so deployments can enable
//! or disable replication without code changes.

use std::time::Duration;

/// Default interval between mirror subscription polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Connection settings for the remote mirror.
#[derive(Debug, Clone)]
pub struct MirrorConfig {
    /// Base URL of the mirror service, e.g. `https://mirror.platefront.app`.
    pub base_url: String,
    pub api_key: Option<String>,
    pub poll_interval: Duration,
}

impl MirrorConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Build from environment. `None` when `PLATEFRONT_MIRROR_URL` is unset
    /// or blank, which means local-only mode.
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("PLATEFRONT_MIRROR_URL")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())?;

        let api_key = std::env::var("PLATEFRONT_MIRROR_KEY")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let poll_interval = std::env::var("PLATEFRONT_MIRROR_POLL_SECS")
            .ok()
            .and_then(|s| s.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_POLL_INTERVAL);

        Some(Self {
            base_url,
            api_key,
            poll_interval,
        })
    }
}
