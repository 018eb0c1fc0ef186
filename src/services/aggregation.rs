//! Cross-build aggregation and failure-pattern clustering.
//!
//! Pure, single-pass computations over an already-fetched, immutable
//! sequence of reports. Everything is recomputed fresh per invocation.
//!
//! Counting convention: the failure frequency table counts per-job
//! occurrences, not distinct builds — a test failing in three jobs of one
//! build contributes three occurrences, so its percentage of builds can
//! exceed 100%. Ranking is by occurrence count, ties broken by ascending
//! name, so repeated runs over the same reports produce identical tables.

use std::collections::BTreeMap;

use tracing::debug;

use crate::models::{
    AggregateStats, BuildReport, BuildStatus, CategoryCount, ErrorCategory, FailureFrequency,
    FailurePattern, FailureSignature, JobFrequency, JobRef, percentage,
};
use crate::services::walker::WalkOutcome;

/// Classify failure detail text into exactly one category.
///
/// Ordered recognizer list, first match wins. New recognizers are appended
/// at the end; the existing order is load-bearing and never changes.
pub fn categorize_error(error_text: &str) -> ErrorCategory {
    let lower = error_text.to_lowercase();
    if error_text.contains("AssertionError") {
        ErrorCategory::AssertionError
    } else if error_text.contains("RFC") || error_text.contains("MUST") {
        ErrorCategory::RfcCompliance
    } else if lower.contains("timeout") || lower.contains("hung") {
        ErrorCategory::TimeoutHung
    } else {
        ErrorCategory::Other
    }
}

/// Compute summary statistics over an ordered sequence of reports.
pub fn aggregate(reports: &[BuildReport]) -> AggregateStats {
    let total = reports.len() as u64;
    let mut successful = 0u64;
    let mut failed = 0u64;
    let mut unknown = 0u64;

    let mut failure_counts: BTreeMap<(String, String), u64> = BTreeMap::new();
    let mut job_failure_builds: BTreeMap<JobRef, u64> = BTreeMap::new();
    let mut hung_builds: BTreeMap<JobRef, u64> = BTreeMap::new();
    let mut category_counts: BTreeMap<ErrorCategory, u64> = BTreeMap::new();

    for report in reports {
        match report.status {
            BuildStatus::Success => successful += 1,
            BuildStatus::Failed => failed += 1,
            BuildStatus::Unknown => unknown += 1,
        }

        for failure in &report.failures {
            *failure_counts
                .entry((failure.test_name.clone(), failure.job.name().to_string()))
                .or_default() += 1;
            *category_counts
                .entry(categorize_error(&failure.error_text))
                .or_default() += 1;
        }

        // Per-build job counts: a job counts once per build it failed in or
        // had attributed test failures in, however many failures that was.
        for job in report.jobs_with_failures() {
            *job_failure_builds.entry(job.clone()).or_default() += 1;
        }
        for job in &report.hung_jobs {
            *hung_builds.entry(job.clone()).or_default() += 1;
        }
    }

    let mut failure_frequencies: Vec<FailureFrequency> = failure_counts
        .into_iter()
        .map(|((test_name, job), count)| FailureFrequency {
            test_name,
            job: JobRef::new(job),
            count,
            percentage: percentage(count, total),
        })
        .collect();
    // Descending count; BTreeMap iteration already ordered ties by name.
    failure_frequencies.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.test_name.cmp(&b.test_name))
            .then_with(|| a.job.cmp(&b.job))
    });

    let job_failures = rank_jobs(job_failure_builds, total);
    let hung_job_counts = rank_jobs(hung_builds, total);

    let mut error_categories: Vec<CategoryCount> = category_counts
        .into_iter()
        .map(|(category, count)| CategoryCount { category, count })
        .collect();
    error_categories.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.category.as_str().cmp(b.category.as_str()))
    });

    let patterns = cluster(reports);

    debug!(
        "Aggregated {} reports: {} ok, {} failed, {} unknown, {} distinct failure keys",
        total,
        successful,
        failed,
        unknown,
        failure_frequencies.len()
    );

    AggregateStats {
        total,
        successful,
        failed,
        unknown,
        skipped: 0,
        truncated: false,
        success_rate: percentage(successful, total),
        failure_frequencies,
        job_failures,
        hung_job_counts,
        error_categories,
        patterns,
    }
}

/// Aggregate a walk's reports, folding in its skip/truncation bookkeeping so
/// percentages stay auditable against the number of builds attempted.
pub fn aggregate_walk(outcome: &WalkOutcome) -> AggregateStats {
    let mut stats = aggregate(&outcome.reports);
    stats.skipped = outcome.skipped.len() as u64;
    stats.truncated = outcome.truncated;
    stats
}

fn rank_jobs(counts: BTreeMap<JobRef, u64>, total: u64) -> Vec<JobFrequency> {
    let mut rows: Vec<JobFrequency> = counts
        .into_iter()
        .map(|(job, count)| JobFrequency {
            job,
            count,
            percentage: percentage(count, total),
        })
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.job.cmp(&b.job)));
    rows
}

/// Group builds by identical failure signature.
///
/// Builds with an empty failure set (successes, or failures with no
/// enumerated test failure) are excluded; they do not form a meaningful
/// pattern. The remaining builds partition exactly: each belongs to the one
/// group matching its signature. Patterns sort by descending member count,
/// ties by the group's newest build id, descending.
pub fn cluster(reports: &[BuildReport]) -> Vec<FailurePattern> {
    let mut groups: BTreeMap<FailureSignature, Vec<u64>> = BTreeMap::new();

    for report in reports {
        let signature = report.signature();
        if signature.is_empty() {
            continue;
        }
        groups.entry(signature).or_default().push(report.build_id);
    }

    let mut patterns: Vec<FailurePattern> = groups
        .into_iter()
        .map(|(signature, build_ids)| {
            let count = build_ids.len() as u64;
            FailurePattern {
                signature,
                build_ids,
                count,
            }
        })
        .collect();

    patterns.sort_by(|a, b| {
        b.count.cmp(&a.count).then_with(|| {
            let newest_a = a.build_ids.iter().max().copied().unwrap_or(0);
            let newest_b = b.build_ids.iter().max().copied().unwrap_or(0);
            newest_b.cmp(&newest_a)
        })
    });

    patterns
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TestFailure;
    use std::collections::BTreeSet;

    fn report(build_id: u64, status: BuildStatus, failures: &[(&str, &str)]) -> BuildReport {
        BuildReport {
            build_id,
            status,
            completed_at: None,
            total_tests: 0,
            quarantined_count: 0,
            failures: failures
                .iter()
                .map(|(test, job)| TestFailure {
                    test_name: test.to_string(),
                    suite: None,
                    job: JobRef::new(*job),
                    error_text: String::new(),
                })
                .collect(),
            fixed_tests: vec![],
            failed_jobs: vec![],
            hung_jobs: BTreeSet::new(),
        }
    }

    #[test]
    fn test_success_rate_18_of_25() {
        let mut reports = Vec::new();
        for i in 0..18 {
            reports.push(report(100 + i, BuildStatus::Success, &[]));
        }
        for i in 0..7 {
            reports.push(report(200 + i, BuildStatus::Failed, &[("t", "j")]));
        }
        let stats = aggregate(&reports);
        assert_eq!(stats.total, 25);
        assert_eq!(stats.successful, 18);
        assert_eq!(stats.failed, 7);
        assert_eq!(stats.success_rate, 72.0);
    }

    #[test]
    fn test_unknown_builds_counted_separately() {
        let reports = vec![
            report(1, BuildStatus::Success, &[]),
            report(2, BuildStatus::Unknown, &[]),
        ];
        let stats = aggregate(&reports);
        assert_eq!(stats.total, 2);
        assert_eq!(stats.successful, 1);
        assert_eq!(stats.failed, 0);
        assert_eq!(stats.unknown, 1);
        assert_eq!(stats.success_rate, 50.0);
    }

    #[test]
    fn test_frequency_counts_per_job_occurrence() {
        // Same test failing in two jobs of the same build: two entries,
        // one occurrence each.
        let reports = vec![report(
            1,
            BuildStatus::Failed,
            &[("test_a", "job_X"), ("test_a", "job_Y")],
        )];
        let stats = aggregate(&reports);
        assert_eq!(stats.failure_frequencies.len(), 2);
        assert!(stats.failure_frequencies.iter().all(|f| f.count == 1));
    }

    #[test]
    fn test_ranking_is_deterministic_with_ties() {
        let reports = vec![
            report(1, BuildStatus::Failed, &[("b_test", "j"), ("a_test", "j")]),
            report(2, BuildStatus::Failed, &[("a_test", "j"), ("b_test", "j")]),
        ];
        let first = aggregate(&reports);
        let second = aggregate(&reports);
        assert_eq!(first.failure_frequencies, second.failure_frequencies);
        // Equal counts: ascending name order
        assert_eq!(first.failure_frequencies[0].test_name, "a_test");
        assert_eq!(first.failure_frequencies[1].test_name, "b_test");
    }

    #[test]
    fn test_categorize_error_first_match_wins() {
        assert_eq!(
            categorize_error("AssertionError: expected 3 routes"),
            ErrorCategory::AssertionError
        );
        assert_eq!(
            categorize_error("RFC Failure: MUST Peer 192.168.0.101 respond"),
            ErrorCategory::RfcCompliance
        );
        assert_eq!(
            categorize_error("job timed out after timeout of 3600s"),
            ErrorCategory::TimeoutHung
        );
        assert_eq!(categorize_error("exit code 1"), ErrorCategory::Other);
        assert_eq!(categorize_error(""), ErrorCategory::Other);
        // AssertionError containing an RFC citation still ranks as assertion
        assert_eq!(
            categorize_error("AssertionError: RFC 5036 section 2.5"),
            ErrorCategory::AssertionError
        );
    }

    #[test]
    fn test_cluster_groups_identical_signatures() {
        let reports = vec![
            report(3, BuildStatus::Failed, &[("test_refout", "job_X")]),
            report(2, BuildStatus::Failed, &[("test_refout", "job_X")]),
            report(1, BuildStatus::Failed, &[("test_refout", "job_Y")]),
        ];
        let patterns = cluster(&reports);
        assert_eq!(patterns.len(), 2);
        assert_eq!(patterns[0].count, 2);
        assert_eq!(patterns[0].build_ids, vec![3, 2]);
        assert_eq!(patterns[1].count, 1);
        assert_eq!(patterns[1].build_ids, vec![1]);
    }

    #[test]
    fn test_cluster_excludes_empty_signatures() {
        let reports = vec![
            report(1, BuildStatus::Success, &[]),
            report(2, BuildStatus::Failed, &[]), // failed job, no test failures
            report(3, BuildStatus::Failed, &[("t", "j")]),
        ];
        let patterns = cluster(&reports);
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].build_ids, vec![3]);
    }

    #[test]
    fn test_cluster_partitions_nonempty_reports() {
        let reports = vec![
            report(1, BuildStatus::Failed, &[("a", "j1")]),
            report(2, BuildStatus::Failed, &[("a", "j1"), ("b", "j2")]),
            report(3, BuildStatus::Failed, &[("a", "j1")]),
        ];
        let patterns = cluster(&reports);
        let mut seen: Vec<u64> = patterns.iter().flat_map(|p| p.build_ids.clone()).collect();
        seen.sort_unstable();
        assert_eq!(seen, vec![1, 2, 3]);
        let total: u64 = patterns.iter().map(|p| p.count).sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn test_order_independence_of_signatures() {
        let a = report(1, BuildStatus::Failed, &[("a", "j1"), ("b", "j2")]);
        let b = report(2, BuildStatus::Failed, &[("b", "j2"), ("a", "j1")]);
        let patterns = cluster(&[a, b]);
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].count, 2);
    }
}
