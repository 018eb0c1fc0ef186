//! Backward time-windowed build walk.
//!
//! Resolves the anchor build's completion time, then steps backward through
//! the plan's history feed collecting reports until one completes before the
//! window cutoff. The window is anchored to the anchor build's own
//! completion time, not to "now", so historical analyses are reproducible.

use chrono::Duration;
use futures_util::StreamExt;
use futures_util::stream;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::BuildReport;
use crate::services::extraction::{PlanKind, parse_report};
use crate::services::fetch::{Fetch, HistoryFeed};

/// Result of one windowed walk. Reports are newest first, anchor included.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkOutcome {
    pub reports: Vec<BuildReport>,
    /// Builds skipped due to per-build fetch/parse failure.
    pub skipped: Vec<u64>,
    /// The history feed stalled (non-decreasing or repeated identifier) and
    /// the walk was terminated early with a partial result.
    pub truncated: bool,
}

/// Walks a plan's history backward within a time window.
pub struct BuildWalker<'a, F: Fetch> {
    fetcher: &'a F,
    feed: &'a dyn HistoryFeed,
    config: &'a Config,
    plan_kind: PlanKind,
}

impl<'a, F: Fetch> BuildWalker<'a, F> {
    pub fn new(
        fetcher: &'a F,
        feed: &'a dyn HistoryFeed,
        config: &'a Config,
        plan_kind: PlanKind,
    ) -> Self {
        BuildWalker {
            fetcher,
            feed,
            config,
            plan_kind,
        }
    }

    /// Collect reports for all builds completing within `max_age` of the
    /// anchor build's completion (closed interval: exactly-at-edge builds
    /// are included).
    ///
    /// An unfetchable or unparsable build inside the window is recorded in
    /// `skipped` and never aborts the walk; only the anchor build itself is
    /// required to resolve. Builds whose report carries no completion time
    /// are kept (they cannot be placed outside the window).
    ///
    /// `EmptyWindow` is the zero-report condition. With the anchor required
    /// to resolve and always included, an empty outcome is impossible by
    /// construction, so the guard below cannot fire today.
    pub async fn walk(&self, anchor_build_id: u64, max_age: Duration) -> AppResult<WalkOutcome> {
        let (_, anchor) = self.fetch_one(anchor_build_id).await;
        let anchor = anchor?;
        let anchor_time = anchor.completed_at.ok_or_else(|| {
            AppError::Parse(format!(
                "Anchor build {} has no completion time",
                anchor_build_id
            ))
        })?;
        let cutoff = anchor_time - max_age;

        info!(
            "Walking builds from {} back to {} (anchor {})",
            anchor_time, cutoff, anchor_build_id
        );

        let (candidates, truncated) =
            usable_candidates(anchor_build_id, self.feed.previous_builds(anchor_build_id));
        if truncated {
            warn!(
                "History feed for anchor {} is not strictly decreasing; walk truncated",
                anchor_build_id
            );
        }

        let mut reports = vec![anchor];
        let mut skipped = Vec::new();

        // The stop decision is sequential, but already-identified candidates
        // are prefetched with a bounded buffer to respect server limits.
        let mut pages = std::pin::pin!(
            stream::iter(candidates.into_iter().map(|id| self.fetch_one(id)))
                .buffered(self.config.prefetch)
        );

        while let Some((build_id, result)) = pages.next().await {
            match result {
                Ok(report) => {
                    if let Some(completed) = report.completed_at {
                        if completed < cutoff {
                            info!(
                                "Reached builds older than the window at {} ({})",
                                build_id, completed
                            );
                            break;
                        }
                    }
                    reports.push(report);
                }
                Err(err) => {
                    warn!("Skipping build {}: {}", build_id, err);
                    skipped.push(build_id);
                }
            }
        }

        if reports.is_empty() {
            return Err(AppError::EmptyWindow);
        }

        info!(
            "Walk complete: {} reports, {} skipped, truncated: {}",
            reports.len(),
            skipped.len(),
            truncated
        );

        Ok(WalkOutcome {
            reports,
            skipped,
            truncated,
        })
    }

    async fn fetch_one(&self, build_id: u64) -> (u64, AppResult<BuildReport>) {
        let url = self.config.build_url(build_id);
        let result = match self.fetcher.fetch(&url).await {
            Ok(html) => parse_report(&html, build_id, self.plan_kind),
            Err(err) => Err(err),
        };
        (build_id, result)
    }
}

/// Keep the strictly-decreasing prefix of the feed's candidates. A
/// non-decreasing or repeated identifier stalls the walk: everything from
/// that point on is dropped and the walk is marked truncated.
fn usable_candidates(anchor: u64, candidates: Vec<u64>) -> (Vec<u64>, bool) {
    let mut usable = Vec::with_capacity(candidates.len());
    let mut prev = anchor;
    for id in candidates {
        if id >= prev {
            return (usable, true);
        }
        prev = id;
        usable.push(id);
    }
    (usable, false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usable_candidates_accepts_decreasing_feed() {
        let (usable, truncated) = usable_candidates(10, vec![9, 8, 7]);
        assert_eq!(usable, vec![9, 8, 7]);
        assert!(!truncated);
    }

    #[test]
    fn test_usable_candidates_stalls_on_repeat() {
        let (usable, truncated) = usable_candidates(10, vec![9, 9, 8]);
        assert_eq!(usable, vec![9]);
        assert!(truncated);
    }

    #[test]
    fn test_usable_candidates_stalls_on_increase() {
        let (usable, truncated) = usable_candidates(10, vec![9, 8, 12]);
        assert_eq!(usable, vec![9, 8]);
        assert!(truncated);
    }

    #[test]
    fn test_usable_candidates_rejects_anchor_repeat() {
        let (usable, truncated) = usable_candidates(10, vec![10, 9]);
        assert!(usable.is_empty());
        assert!(truncated);
    }
}
