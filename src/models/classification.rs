//! New/Existing/Fixed classification model.
//!
//! Classification is recomputed per comparison and never persisted; the
//! "previous" failure set is always an explicit caller-supplied input.

use serde::{Deserialize, Serialize};

use super::build_report::{FailureSignature, TestFailure};

/// Whether a failure was already present in the reference build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    New,
    Existing,
}

/// A test failure labeled against a reference failure set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedFailure {
    pub failure: TestFailure,
    pub classification: Classification,
}

/// Result of comparing a build's failure set against a reference set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FailureDiff {
    /// Failing now, not failing in the reference build.
    pub new: FailureSignature,
    /// Failing in both.
    pub existing: FailureSignature,
    /// Failing in the reference build, absent now.
    pub fixed: FailureSignature,
}
