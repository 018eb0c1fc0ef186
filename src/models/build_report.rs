//! Parsed build report model.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Overall build result read from the report's summary badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildStatus {
    Success,
    Failed,
    Unknown,
}

impl BuildStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Reference to one execution leg of a build (e.g. a platform/part combination).
///
/// Two `JobRef`s are equal iff their names are equal; job naming is external
/// and stable only in value, not in form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct JobRef(pub String);

impl JobRef {
    pub fn new(name: impl Into<String>) -> Self {
        JobRef(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One failing test occurrence within a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestFailure {
    /// Exact reusable test identifier (e.g. `ANVL-LDP-9.5` or
    /// `test_rib_ipv6_step3`). This is the join key across builds.
    pub test_name: String,
    /// Suite name if the document groups failures by suite.
    pub suite: Option<String>,
    /// Execution context responsible for the failure. Always present.
    pub job: JobRef,
    /// Raw failure detail text, whitespace-normalized. May be empty.
    pub error_text: String,
}

impl TestFailure {
    /// The `(test_name, job)` pair compared build-to-build.
    pub fn key(&self) -> FailureKey {
        FailureKey {
            test_name: self.test_name.clone(),
            job: self.job.clone(),
        }
    }
}

/// The `(test_name, job)` pair that identifies a failure across builds.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FailureKey {
    pub test_name: String,
    pub job: JobRef,
}

impl fmt::Display for FailureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.job, self.test_name)
    }
}

/// The set of `(test_name, job)` pairs failing in one build.
///
/// Two builds share a failure pattern iff their signatures are set-equal.
pub type FailureSignature = BTreeSet<FailureKey>;

/// AddressSanitizer finding extracted from report page annotations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AsanFinding {
    /// Raw artifact path from the annotation
    /// (e.g. `bfd_vrf_topo1.test_bfd_vrf_topo1/r3.asan.bgpd.27086`).
    pub test_path: String,
    /// Test name recovered from the path, when the path is recognizable.
    pub test_name: Option<String>,
    /// Leak count when the annotation reports triggered leaks.
    pub leak_count: Option<u64>,
    /// Error kind: `memory-leak` when leaks were counted, else `asan-error`.
    pub error_kind: String,
}

impl AsanFinding {
    /// One-line summary folded into the owning job's failure reason.
    pub fn summary(&self) -> String {
        let test = self.test_name.as_deref().unwrap_or("unknown test");
        match self.leak_count {
            Some(n) => format!("Memory leak detected ({} leak(s)) in {}", n, test),
            None => format!("AddressSanitizer error in {}", test),
        }
    }
}

/// A job whose overall result was failure, with whatever failure context the
/// report exposed. Distinct from individual test failures: a job can fail
/// with no enumerated test failure at all (build error, hang).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedJob {
    pub job: JobRef,
    /// Job flagged as hung/timed out rather than cleanly failed.
    pub hung: bool,
    /// Human-readable failure reason recovered from the report.
    pub reason: String,
    /// Job result key for URL construction, when present in the document.
    pub key: Option<String>,
    /// AddressSanitizer finding attached to sanitizer jobs.
    pub asan: Option<AsanFinding>,
}

/// One parsed build report. Created by parsing one document, immutable after.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildReport {
    /// Build number; monotonic within a plan, not globally unique.
    pub build_id: u64,
    pub status: BuildStatus,
    /// Completion timestamp, if the document reported one.
    pub completed_at: Option<DateTime<Utc>>,
    /// Total test count, 0 if not reported.
    pub total_tests: u64,
    pub quarantined_count: u64,
    /// Failures in document order (order is display-only, not semantic).
    pub failures: Vec<TestFailure>,
    /// Tests the document lists as fixed relative to the previous build.
    pub fixed_tests: Vec<String>,
    /// Jobs whose overall result was failure, deduplicated by name.
    pub failed_jobs: Vec<FailedJob>,
    /// Jobs flagged as hung/timed out.
    pub hung_jobs: BTreeSet<JobRef>,
}

impl BuildReport {
    /// The build's failure signature: its `(test, job)` set, duplicate-free.
    pub fn signature(&self) -> FailureSignature {
        self.failures.iter().map(TestFailure::key).collect()
    }

    /// Jobs in `failed_jobs`, as a name set.
    pub fn failed_job_refs(&self) -> BTreeSet<&JobRef> {
        self.failed_jobs.iter().map(|j| &j.job).collect()
    }

    /// Jobs that failed overall or have at least one attributed test failure.
    pub fn jobs_with_failures(&self) -> BTreeSet<&JobRef> {
        let mut jobs = self.failed_job_refs();
        jobs.extend(self.failures.iter().map(|f| &f.job));
        jobs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(test: &str, job: &str) -> TestFailure {
        TestFailure {
            test_name: test.to_string(),
            suite: None,
            job: JobRef::new(job),
            error_text: String::new(),
        }
    }

    #[test]
    fn test_signature_is_duplicate_free() {
        let report = BuildReport {
            build_id: 1,
            status: BuildStatus::Failed,
            completed_at: None,
            total_tests: 0,
            quarantined_count: 0,
            failures: vec![failure("t1", "job A"), failure("t1", "job A")],
            fixed_tests: vec![],
            failed_jobs: vec![],
            hung_jobs: BTreeSet::new(),
        };
        assert_eq!(report.signature().len(), 1);
    }

    #[test]
    fn test_job_ref_equality_is_by_name() {
        assert_eq!(JobRef::new("TOPO9 Part 1"), JobRef::new("TOPO9 Part 1"));
        assert_ne!(JobRef::new("TOPO9 Part 1"), JobRef::new("TOPO9 Part 2"));
    }

    #[test]
    fn test_failure_key_display_includes_job_context() {
        let key = failure("test_refout", "job_X").key();
        assert_eq!(key.to_string(), "job_X - test_refout");
    }
}
