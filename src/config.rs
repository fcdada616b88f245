//! Engine configuration with env-variable overrides.

use std::time::Duration;

pub const DEFAULT_HTTP_BASE: &str = "http://localhost:8000";
pub const DEFAULT_WS_URL: &str = "ws://localhost:8000/ws";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_RECONNECT_BACKOFF_MS: u64 = 1000;
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 5;
pub const DEFAULT_AUTH_REDIRECT_DELAY_MS: u64 = 1500;
pub const DEFAULT_COMMAND_QUEUE_CAPACITY: usize = 32;

/// Tuning knobs for the sync engine. Defaults match the production backend;
/// tests shrink the timing values to keep runs fast.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL for the snapshot and access-gate endpoints.
    pub http_base: String,
    /// WebSocket URL for the push channel.
    pub ws_url: String,
    /// Fixed interval between full snapshot fetches.
    pub poll_interval: Duration,
    /// Fixed delay between push-channel reconnect attempts.
    pub reconnect_backoff: Duration,
    /// Consecutive failed handshakes tolerated before giving up.
    pub max_reconnect_attempts: u32,
    /// Pause before redirecting to login after an authentication rejection.
    pub auth_redirect_delay: Duration,
    /// Bounded capacity of the outbound command queue.
    pub command_queue_capacity: usize,
}

impl Config {
    /// Config for the given endpoints with default timing.
    #[must_use]
    pub fn new(http_base: impl Into<String>, ws_url: impl Into<String>) -> Self {
        Self {
            http_base: trim_base(&http_base.into()),
            ws_url: ws_url.into(),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            reconnect_backoff: Duration::from_millis(DEFAULT_RECONNECT_BACKOFF_MS),
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            auth_redirect_delay: Duration::from_millis(DEFAULT_AUTH_REDIRECT_DELAY_MS),
            command_queue_capacity: DEFAULT_COMMAND_QUEUE_CAPACITY,
        }
    }

    /// Build config from `LABSLOT_*` environment variables, falling back to
    /// defaults for anything unset or unparsable.
    #[must_use]
    pub fn from_env() -> Self {
        let http_base = std::env::var("LABSLOT_HTTP_BASE").unwrap_or_else(|_| DEFAULT_HTTP_BASE.to_owned());
        let ws_url = std::env::var("LABSLOT_WS_URL").unwrap_or_else(|_| DEFAULT_WS_URL.to_owned());
        Self {
            http_base: trim_base(&http_base),
            ws_url,
            poll_interval: Duration::from_millis(env_parse("LABSLOT_POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL_MS)),
            reconnect_backoff: Duration::from_millis(env_parse(
                "LABSLOT_RECONNECT_BACKOFF_MS",
                DEFAULT_RECONNECT_BACKOFF_MS,
            )),
            max_reconnect_attempts: env_parse("LABSLOT_MAX_RECONNECT_ATTEMPTS", DEFAULT_MAX_RECONNECT_ATTEMPTS),
            auth_redirect_delay: Duration::from_millis(env_parse(
                "LABSLOT_AUTH_REDIRECT_DELAY_MS",
                DEFAULT_AUTH_REDIRECT_DELAY_MS,
            )),
            command_queue_capacity: env_parse("LABSLOT_COMMAND_QUEUE_CAPACITY", DEFAULT_COMMAND_QUEUE_CAPACITY),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_HTTP_BASE, DEFAULT_WS_URL)
    }
}

fn trim_base(base: &str) -> String {
    base.trim_end_matches('/').to_owned()
}

fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
