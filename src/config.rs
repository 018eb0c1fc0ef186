//! Analyzer configuration loaded from environment variables.

use std::env;
use std::time::Duration;

use crate::error::{AppError, AppResult};

/// Default values used when the corresponding environment variable is unset.
pub mod defaults {
    pub const BASE_URL: &str = "https://ci1.netdef.org";
    pub const PLAN_KEY: &str = "FRR-FRR";
    pub const FETCH_TIMEOUT_SECS: u64 = 30;
    pub const FETCH_RETRIES: u32 = 2;
    pub const PREFETCH: usize = 4; // Bounded concurrent page fetches during a walk
    pub const MAX_WALK: u64 = 200; // Hard cap on builds examined per window
    pub const WINDOW_DAYS: i64 = 7;
}

/// Analyzer configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the CI server (e.g. `https://ci1.netdef.org`)
    pub base_url: String,
    /// Plan key builds are numbered under (e.g. `FRR-FRR`)
    pub plan_key: String,
    /// Per-fetch timeout in seconds
    pub fetch_timeout_secs: u64,
    /// Retry attempts for transient fetch failures
    pub fetch_retries: u32,
    /// Concurrent page fetches while walking a window
    pub prefetch: usize,
    /// Maximum builds examined per windowed walk
    pub max_walk: u64,
    /// Default analysis window length in days
    pub window_days: i64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables (all optional):
    /// - `CI_BASE_URL`: CI server base URL (default: `https://ci1.netdef.org`)
    /// - `CI_PLAN_KEY`: Plan key (default: `FRR-FRR`)
    /// - `CI_FETCH_TIMEOUT_SECS`: Per-fetch timeout in seconds (default: 30)
    /// - `CI_FETCH_RETRIES`: Retries for transient fetch failures (default: 2)
    /// - `CI_PREFETCH`: Concurrent fetches during a walk (default: 4)
    /// - `CI_MAX_WALK`: Max builds examined per window (default: 200)
    /// - `CI_WINDOW_DAYS`: Default window length in days (default: 7)
    pub fn from_env() -> AppResult<Self> {
        let base_url = env::var("CI_BASE_URL").unwrap_or_else(|_| defaults::BASE_URL.to_string());
        let base_url = base_url.trim_end_matches('/').to_string();

        let plan_key = env::var("CI_PLAN_KEY").unwrap_or_else(|_| defaults::PLAN_KEY.to_string());

        let fetch_timeout_secs = parse_env("CI_FETCH_TIMEOUT_SECS", defaults::FETCH_TIMEOUT_SECS)?;
        let fetch_retries = parse_env("CI_FETCH_RETRIES", defaults::FETCH_RETRIES)?;
        let prefetch = parse_env("CI_PREFETCH", defaults::PREFETCH)?;
        let max_walk = parse_env("CI_MAX_WALK", defaults::MAX_WALK)?;
        let window_days = parse_env("CI_WINDOW_DAYS", defaults::WINDOW_DAYS)?;

        if prefetch == 0 {
            return Err(AppError::InvalidInput(
                "CI_PREFETCH must be at least 1".to_string(),
            ));
        }
        if window_days < 1 {
            return Err(AppError::InvalidInput(
                "CI_WINDOW_DAYS must be a positive number of days".to_string(),
            ));
        }

        Ok(Config {
            base_url,
            plan_key,
            fetch_timeout_secs,
            fetch_retries,
            prefetch,
            max_walk,
            window_days,
        })
    }

    /// Per-fetch timeout as a Duration.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// URL of the report page for one build of the configured plan.
    pub fn build_url(&self, build_id: u64) -> String {
        format!("{}/browse/{}-{}", self.base_url, self.plan_key, build_id)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_url: defaults::BASE_URL.to_string(),
            plan_key: defaults::PLAN_KEY.to_string(),
            fetch_timeout_secs: defaults::FETCH_TIMEOUT_SECS,
            fetch_retries: defaults::FETCH_RETRIES,
            prefetch: defaults::PREFETCH,
            max_walk: defaults::MAX_WALK,
            window_days: defaults::WINDOW_DAYS,
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &'static str, default: T) -> AppResult<T> {
    match env::var(name) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|_| AppError::InvalidInput(format!("{} must be a valid number", name))),
        Err(_) => Ok(default),
    }
}
