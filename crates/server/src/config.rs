//! Runtime configuration

use std::time::Duration;

use clap::Parser;

use crate::engine::EngineConfig;

/// Live monitoring engine for game-server admin panels.
#[derive(Debug, Parser)]
#[command(name = "staffwatch", version, about)]
pub struct Config {
    /// Base URL of the admin panel API.
    #[arg(long, env = "STAFFWATCH_BASE_URL")]
    pub base_url: String,

    /// Seconds between monitor poll cycles.
    #[arg(long, env = "STAFFWATCH_MONITOR_INTERVAL", default_value_t = 10)]
    pub monitor_interval: u64,

    /// Seconds between live-view refresh cycles.
    #[arg(long, env = "STAFFWATCH_REFRESH_INTERVAL", default_value_t = 15)]
    pub refresh_interval: u64,

    /// Per-request timeout in seconds for all panel calls.
    #[arg(long, env = "STAFFWATCH_REQUEST_TIMEOUT", default_value_t = 8)]
    pub request_timeout: u64,

    /// Panel account login.
    #[arg(long, env = "STAFFWATCH_ACCOUNT")]
    pub account: String,

    /// Panel account password.
    #[arg(long, env = "STAFFWATCH_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Target game server id (e.g. RU5).
    #[arg(long, env = "STAFFWATCH_SERVER")]
    pub server: String,

    /// Second-factor code for the login exchange.
    #[arg(long, env = "STAFFWATCH_2FA_CODE", default_value = "")]
    pub code: String,

    /// View to open on startup: summary, online, reports or servers.
    #[arg(long, default_value = "summary")]
    pub view: String,
}

impl Config {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            monitor_interval: Duration::from_secs(self.monitor_interval),
            refresh_interval: Duration::from_secs(self.refresh_interval),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}
