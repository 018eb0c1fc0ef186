//! Failure classification against a reference build.
//!
//! Pure set algebra over `(test_name, job)` pairs. The reference ("previous")
//! set is always supplied by the caller — for the single-build tool it is the
//! immediately preceding build's failure set — so the classifier stays pure
//! and testable in isolation. Identical inputs always yield identical
//! output; there is no ordering dependence.

use crate::models::{
    Classification, ClassifiedFailure, FailureDiff, FailureSignature, TestFailure,
};

/// Compare a build's failure set against a reference set.
///
/// `new = current − previous`, `existing = current ∩ previous`,
/// `fixed = previous − current`.
pub fn classify(current: &FailureSignature, previous: &FailureSignature) -> FailureDiff {
    FailureDiff {
        new: current.difference(previous).cloned().collect(),
        existing: current.intersection(previous).cloned().collect(),
        fixed: previous.difference(current).cloned().collect(),
    }
}

/// Label each failure of a report as New or Existing relative to the
/// reference set. Duplicates of the same `(test, job)` pair get the same
/// label; order follows the input (document order).
pub fn classify_failures(
    failures: &[TestFailure],
    previous: &FailureSignature,
) -> Vec<ClassifiedFailure> {
    failures
        .iter()
        .map(|failure| {
            let classification = if previous.contains(&failure.key()) {
                Classification::Existing
            } else {
                Classification::New
            };
            ClassifiedFailure {
                failure: failure.clone(),
                classification,
            }
        })
        .collect()
}
