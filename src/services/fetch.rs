//! Fetch and history-feed collaborators.
//!
//! The analysis core consumes exactly two interfaces from its environment: a
//! page fetcher and a per-plan history feed. Both are traits so the walker
//! can run against in-memory fakes in tests.

use std::time::Duration;

use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult};

/// Network collaborator: fetch one document by URL.
///
/// May fail with a transport error, or return a non-report document (login
/// page, error page) which surfaces to the parser as unrecognized input.
#[async_trait::async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, url: &str) -> AppResult<String>;
}

/// Enumerates prior build identifiers of a plan without fetching full
/// reports. Identifiers must be strictly decreasing; the walker treats any
/// other ordering as a stall.
pub trait HistoryFeed: Send + Sync {
    /// Build ids older than `anchor`, newest first.
    fn previous_builds(&self, anchor: u64) -> Vec<u64>;
}

/// reqwest-backed fetcher with a per-fetch timeout and a bounded retry count
/// for transient failures. Exhausted retries surface as `AppError::Fetch`;
/// during a windowed walk that degrades to skipping the one build.
pub struct HttpFetcher {
    client: reqwest::Client,
    retries: u32,
}

impl HttpFetcher {
    pub fn new(config: &Config) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.fetch_timeout())
            .build()?;
        Ok(HttpFetcher {
            client,
            retries: config.fetch_retries,
        })
    }
}

#[async_trait::async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> AppResult<String> {
        let mut last_err = None;

        for attempt in 0..=self.retries {
            if attempt > 0 {
                // Linear backoff between attempts
                tokio::time::sleep(Duration::from_millis(500 * attempt as u64)).await;
                debug!("Retrying fetch of {} (attempt {})", url, attempt + 1);
            }

            match self.client.get(url).send().await {
                Ok(response) => match response.error_for_status() {
                    Ok(response) => return Ok(response.text().await?),
                    Err(err) => {
                        warn!("Fetch of {} returned error status: {}", url, err);
                        last_err = Some(AppError::from(err));
                    }
                },
                Err(err) => {
                    warn!("Fetch of {} failed: {}", url, err);
                    last_err = Some(AppError::from(err));
                }
            }
        }

        Err(last_err.unwrap_or_else(|| AppError::Fetch(format!("Failed to fetch {}", url))))
    }
}

/// History feed for plans with sequentially numbered builds: steps backward
/// from the anchor one build at a time, capped by the configured walk limit.
pub struct PlanHistoryFeed {
    max_walk: u64,
}

impl PlanHistoryFeed {
    pub fn new(config: &Config) -> Self {
        PlanHistoryFeed {
            max_walk: config.max_walk,
        }
    }
}

impl HistoryFeed for PlanHistoryFeed {
    fn previous_builds(&self, anchor: u64) -> Vec<u64> {
        (1..anchor)
            .rev()
            .take(self.max_walk as usize)
            .collect()
    }
}
