//! Analysis engine services.

pub mod aggregation;
pub mod classifier;
pub mod extraction;
pub mod fetch;
pub mod walker;

pub use aggregation::{aggregate, aggregate_walk, categorize_error, cluster};
pub use classifier::{classify, classify_failures};
pub use extraction::{PlanKind, parse_report};
pub use fetch::{Fetch, HistoryFeed, HttpFetcher, PlanHistoryFeed};
pub use walker::{BuildWalker, WalkOutcome};
