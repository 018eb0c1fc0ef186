//! Derived cross-build statistics model.
//!
//! All values here are recomputed fresh per analysis run from an in-memory
//! sequence of reports; nothing is cached across runs.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::build_report::{FailureSignature, JobRef};

/// Error-text category, decided by an ordered recognizer list (first match
/// wins). New recognizers are appended; existing ones are never reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Exception-style assertion marker in the error text.
    AssertionError,
    /// RFC/reference-citation marker (`RFC`, `MUST`).
    RfcCompliance,
    /// Hang or timeout marker.
    TimeoutHung,
    /// Anything else, including empty error text.
    Other,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AssertionError => "AssertionError",
            Self::RfcCompliance => "RFC Compliance",
            Self::TimeoutHung => "Timeout/Hung",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One ranked entry in the failure frequency table.
///
/// Keyed by the `(test, job)` pair: the same test failing in two jobs is two
/// entries. Counts are per job-occurrence, not per distinct build, so a test
/// failing in several jobs of one build counts each occurrence (its
/// percentage can legitimately exceed 100% of builds).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureFrequency {
    pub test_name: String,
    pub job: JobRef,
    /// Occurrences across the analyzed reports.
    pub count: u64,
    /// `count / total_builds * 100`.
    pub percentage: f64,
}

impl fmt::Display for FailureFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.job, self.test_name)
    }
}

/// One ranked entry in a per-job frequency table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobFrequency {
    pub job: JobRef,
    /// Number of builds the job was affected in.
    pub count: u64,
    pub percentage: f64,
}

/// One ranked entry in the error-category table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category: ErrorCategory,
    /// Failure occurrences, not distinct tests.
    pub count: u64,
}

/// A group of builds sharing the exact same failure signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailurePattern {
    pub signature: FailureSignature,
    /// Member build ids, newest first.
    pub build_ids: Vec<u64>,
    pub count: u64,
}

/// Summary statistics over an ordered sequence of build reports.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AggregateStats {
    /// Builds analyzed (the denominator for all percentages).
    pub total: u64,
    pub successful: u64,
    pub failed: u64,
    /// Builds whose status could not be determined; counted in `total` but
    /// toward neither success nor failure, so totals reconcile.
    pub unknown: u64,
    /// Builds skipped due to per-build fetch/parse failure during the walk.
    pub skipped: u64,
    /// The walk terminated early on a stalled history feed.
    pub truncated: bool,
    pub success_rate: f64,
    /// Ranked per-`(test, job)` occurrence counts, descending.
    pub failure_frequencies: Vec<FailureFrequency>,
    /// Builds in which each job failed or had attributed test failures.
    pub job_failures: Vec<JobFrequency>,
    /// Builds in which each job was flagged hung/timed out.
    pub hung_job_counts: Vec<JobFrequency>,
    /// Error-category occurrence counts, descending.
    pub error_categories: Vec<CategoryCount>,
    /// Builds grouped by identical failure signature.
    pub patterns: Vec<FailurePattern>,
}

/// Percentage of `count` over `total`, rounded to one decimal with standard
/// round-half-away-from-zero.
pub fn percentage(count: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let raw = count as f64 / total as f64 * 100.0;
    (raw * 10.0).round() / 10.0
}
