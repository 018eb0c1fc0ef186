//! Windowed-walk tests against in-memory fetch and history-feed fakes.

use std::collections::HashMap;

use chrono::Duration;

use ci_build_analyzer::config::Config;
use ci_build_analyzer::error::{AppError, AppResult};
use ci_build_analyzer::services::{BuildWalker, Fetch, HistoryFeed, PlanKind, aggregate_walk};

struct FakeFetcher {
    pages: HashMap<String, String>,
}

#[async_trait::async_trait]
impl Fetch for FakeFetcher {
    async fn fetch(&self, url: &str) -> AppResult<String> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| AppError::Fetch(format!("no page for {}", url)))
    }
}

struct FakeFeed {
    ids: Vec<u64>,
}

impl HistoryFeed for FakeFeed {
    fn previous_builds(&self, _anchor: u64) -> Vec<u64> {
        self.ids.clone()
    }
}

/// Minimal but recognizable report page.
fn page(build_id: u64, success: bool, completed: &str) -> String {
    format!(
        r#"<h1>Build: #{} {}</h1>
<dt class="completed">Completed</dt>
<dd><time datetime="{}">completed</time></dd>
<p>Total tests 100</p>"#,
        build_id,
        if success { "was successful" } else { "failed" },
        completed,
    )
}

struct Fixture {
    config: Config,
    pages: HashMap<String, String>,
}

impl Fixture {
    fn new() -> Self {
        Fixture {
            config: Config::default(),
            pages: HashMap::new(),
        }
    }

    fn with_page(mut self, build_id: u64, success: bool, completed: &str) -> Self {
        self.pages
            .insert(self.config.build_url(build_id), page(build_id, success, completed));
        self
    }

    fn with_raw_page(mut self, build_id: u64, html: &str) -> Self {
        self.pages
            .insert(self.config.build_url(build_id), html.to_string());
        self
    }

    fn fetcher(&self) -> FakeFetcher {
        FakeFetcher {
            pages: self.pages.clone(),
        }
    }
}

#[tokio::test]
async fn test_walk_collects_builds_within_window() {
    let fixture = Fixture::new()
        .with_page(10, true, "2025-10-17T12:00:00Z")
        .with_page(9, false, "2025-10-15T12:00:00Z")
        .with_page(8, true, "2025-10-11T12:00:00Z")
        .with_page(7, true, "2025-10-01T12:00:00Z");
    let fetcher = fixture.fetcher();
    let feed = FakeFeed { ids: vec![9, 8, 7] };
    let walker = BuildWalker::new(&fetcher, &feed, &fixture.config, PlanKind::Compliance);

    let outcome = walker.walk(10, Duration::days(7)).await.unwrap();

    let ids: Vec<u64> = outcome.reports.iter().map(|r| r.build_id).collect();
    assert_eq!(ids, vec![10, 9, 8]);
    assert!(outcome.skipped.is_empty());
    assert!(!outcome.truncated);
}

#[tokio::test]
async fn test_window_edge_is_inclusive() {
    // Build 9 completes exactly at anchor_time - 7 days
    let fixture = Fixture::new()
        .with_page(10, true, "2025-10-17T12:00:00Z")
        .with_page(9, true, "2025-10-10T12:00:00Z")
        .with_page(8, true, "2025-10-10T11:59:59Z");
    let fetcher = fixture.fetcher();
    let feed = FakeFeed { ids: vec![9, 8] };
    let walker = BuildWalker::new(&fetcher, &feed, &fixture.config, PlanKind::Compliance);

    let outcome = walker.walk(10, Duration::days(7)).await.unwrap();

    let ids: Vec<u64> = outcome.reports.iter().map(|r| r.build_id).collect();
    assert_eq!(ids, vec![10, 9]);
}

#[tokio::test]
async fn test_unreadable_build_is_skipped_not_fatal() {
    let fixture = Fixture::new()
        .with_page(10, true, "2025-10-17T12:00:00Z")
        .with_raw_page(9, "<html><h1>Log in</h1></html>")
        .with_page(8, false, "2025-10-16T12:00:00Z");
    let fetcher = fixture.fetcher();
    let feed = FakeFeed { ids: vec![9, 8] };
    let walker = BuildWalker::new(&fetcher, &feed, &fixture.config, PlanKind::Compliance);

    let outcome = walker.walk(10, Duration::days(7)).await.unwrap();

    let ids: Vec<u64> = outcome.reports.iter().map(|r| r.build_id).collect();
    assert_eq!(ids, vec![10, 8]);
    assert_eq!(outcome.skipped, vec![9]);
}

#[tokio::test]
async fn test_unfetchable_build_is_skipped_not_fatal() {
    // Build 9 has no page at all
    let fixture = Fixture::new()
        .with_page(10, true, "2025-10-17T12:00:00Z")
        .with_page(8, true, "2025-10-16T12:00:00Z");
    let fetcher = fixture.fetcher();
    let feed = FakeFeed { ids: vec![9, 8] };
    let walker = BuildWalker::new(&fetcher, &feed, &fixture.config, PlanKind::Compliance);

    let outcome = walker.walk(10, Duration::days(7)).await.unwrap();

    let ids: Vec<u64> = outcome.reports.iter().map(|r| r.build_id).collect();
    assert_eq!(ids, vec![10, 8]);
    assert_eq!(outcome.skipped, vec![9]);
}

#[tokio::test]
async fn test_exhausted_feed_yields_anchor_alone() {
    let fixture = Fixture::new().with_page(10, true, "2025-10-17T12:00:00Z");
    let fetcher = fixture.fetcher();
    let feed = FakeFeed { ids: vec![] };
    let walker = BuildWalker::new(&fetcher, &feed, &fixture.config, PlanKind::Compliance);

    let outcome = walker.walk(10, Duration::days(7)).await.unwrap();

    let ids: Vec<u64> = outcome.reports.iter().map(|r| r.build_id).collect();
    assert_eq!(ids, vec![10]);
    assert!(outcome.skipped.is_empty());
    assert!(!outcome.truncated);
}

#[tokio::test]
async fn test_anchor_failure_is_fatal() {
    let fixture = Fixture::new().with_page(9, true, "2025-10-16T12:00:00Z");
    let fetcher = fixture.fetcher();
    let feed = FakeFeed { ids: vec![9] };
    let walker = BuildWalker::new(&fetcher, &feed, &fixture.config, PlanKind::Compliance);

    assert!(walker.walk(10, Duration::days(7)).await.is_err());
}

#[tokio::test]
async fn test_stalled_feed_truncates_with_partial_result() {
    let fixture = Fixture::new()
        .with_page(10, true, "2025-10-17T12:00:00Z")
        .with_page(9, true, "2025-10-16T12:00:00Z")
        .with_page(8, true, "2025-10-15T12:00:00Z");
    let fetcher = fixture.fetcher();
    // Feed repeats an identifier: everything from the repeat on is dropped
    let feed = FakeFeed {
        ids: vec![9, 9, 8],
    };
    let walker = BuildWalker::new(&fetcher, &feed, &fixture.config, PlanKind::Compliance);

    let outcome = walker.walk(10, Duration::days(7)).await.unwrap();

    let ids: Vec<u64> = outcome.reports.iter().map(|r| r.build_id).collect();
    assert_eq!(ids, vec![10, 9]);
    assert!(outcome.truncated);
}

#[tokio::test]
async fn test_build_without_completion_time_stays_in_window() {
    let undated = r#"<h1>Build: #9 failed</h1><p>Total tests 50</p>"#;
    let fixture = Fixture::new()
        .with_page(10, true, "2025-10-17T12:00:00Z")
        .with_raw_page(9, undated)
        .with_page(8, true, "2025-10-16T12:00:00Z");
    let fetcher = fixture.fetcher();
    let feed = FakeFeed { ids: vec![9, 8] };
    let walker = BuildWalker::new(&fetcher, &feed, &fixture.config, PlanKind::Compliance);

    let outcome = walker.walk(10, Duration::days(7)).await.unwrap();

    let ids: Vec<u64> = outcome.reports.iter().map(|r| r.build_id).collect();
    assert_eq!(ids, vec![10, 9, 8]);
}

#[tokio::test]
async fn test_walk_stops_at_first_build_older_than_window() {
    // Build 8 is out of window; build 7 would be fetchable but must not appear
    let fixture = Fixture::new()
        .with_page(10, true, "2025-10-17T12:00:00Z")
        .with_page(9, true, "2025-10-14T12:00:00Z")
        .with_page(8, true, "2025-10-01T12:00:00Z")
        .with_page(7, false, "2025-10-16T12:00:00Z");
    let fetcher = fixture.fetcher();
    let feed = FakeFeed { ids: vec![9, 8, 7] };
    let walker = BuildWalker::new(&fetcher, &feed, &fixture.config, PlanKind::Compliance);

    let outcome = walker.walk(10, Duration::days(7)).await.unwrap();

    let ids: Vec<u64> = outcome.reports.iter().map(|r| r.build_id).collect();
    assert_eq!(ids, vec![10, 9]);
}

#[tokio::test]
async fn test_aggregate_walk_carries_skip_and_truncation_bookkeeping() {
    let fixture = Fixture::new()
        .with_page(10, true, "2025-10-17T12:00:00Z")
        .with_page(8, false, "2025-10-16T12:00:00Z");
    let fetcher = fixture.fetcher();
    let feed = FakeFeed {
        ids: vec![9, 8, 8],
    };
    let walker = BuildWalker::new(&fetcher, &feed, &fixture.config, PlanKind::Compliance);

    let outcome = walker.walk(10, Duration::days(7)).await.unwrap();
    let stats = aggregate_walk(&outcome);

    assert_eq!(stats.total, 2);
    assert_eq!(stats.successful, 1);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.skipped, 1);
    assert!(stats.truncated);
    assert_eq!(stats.success_rate, 50.0);
}
