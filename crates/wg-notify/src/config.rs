//! Runtime configuration.

use std::env;
use std::time::Duration;

use crate::publish::RetryPolicy;

/// Datatracker site the feed and document links point at.
pub const DEFAULT_API_BASE: &str = "https://datatracker.ietf.org";

/// Twitter API host.
pub const DEFAULT_PUBLISH_API_BASE: &str = "https://api.twitter.com";

/// Events requested per feed page.
pub const DEFAULT_CHUNK_SIZE: usize = 250;

/// Extra feed pages fetched while looking for the checkpoint.
pub const DEFAULT_REQUEST_LIMIT: usize = 10;

/// Per-request deadline for Datatracker and Twitter calls.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Rate-limited posts are retried this many times before being abandoned.
pub const DEFAULT_RETRY_MAX: u32 = 2;

/// Fixed wait between rate-limited attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Tunables for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Datatracker base URL (`DATATRACKER_API_BASE`).
    pub api_base: String,
    /// Events per feed page (`DATATRACKER_CHUNK_SIZE`).
    pub chunk_size: usize,
    /// Lookback bound in extra pages (`DATATRACKER_REQUEST_LIMIT`).
    pub request_limit: usize,
    /// Deadline applied to every HTTP request (`DATATRACKER_TIMEOUT_SECS`).
    pub request_timeout: Duration,
    /// Twitter API base URL (`TWITTER_API_BASE`).
    pub publish_api_base: String,
    /// Rate-limit retries per message (`TWITTER_RETRY_MAX`).
    pub retry_max: u32,
    /// Backoff between rate-limit retries (`TWITTER_RETRY_DELAY_SECS`).
    pub retry_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            request_limit: DEFAULT_REQUEST_LIMIT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            publish_api_base: DEFAULT_PUBLISH_API_BASE.to_string(),
            retry_max: DEFAULT_RETRY_MAX,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl Config {
    /// Build a config from the process environment, falling back to defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    ///
    /// Unset, empty, or unparseable values keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let text = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            api_base: text("DATATRACKER_API_BASE").unwrap_or(defaults.api_base),
            chunk_size: text("DATATRACKER_CHUNK_SIZE")
                .and_then(|s| s.trim().parse().ok())
                .filter(|&n: &usize| n > 0)
                .unwrap_or(defaults.chunk_size),
            request_limit: text("DATATRACKER_REQUEST_LIMIT")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(defaults.request_limit),
            request_timeout: text("DATATRACKER_TIMEOUT_SECS")
                .and_then(|s| s.trim().parse().ok())
                .map_or(defaults.request_timeout, Duration::from_secs),
            publish_api_base: text("TWITTER_API_BASE").unwrap_or(defaults.publish_api_base),
            retry_max: text("TWITTER_RETRY_MAX")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(defaults.retry_max),
            retry_delay: text("TWITTER_RETRY_DELAY_SECS")
                .and_then(|s| s.trim().parse().ok())
                .map_or(defaults.retry_delay, Duration::from_secs),
        }
    }

    /// Retry policy for rate-limited posts.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_max, self.retry_delay)
    }

    /// Public link to a document page, e.g. `https://datatracker.ietf.org/doc/<name>/`.
    #[must_use]
    pub fn document_link(&self, name: &str) -> String {
        format!("{}/doc/{name}/", self.api_base.trim_end_matches('/'))
    }
}
