//! Domain models for the CI build analyzer.

pub mod aggregate;
pub mod build_report;
pub mod classification;

// Re-export commonly used types
pub use aggregate::{
    AggregateStats, CategoryCount, ErrorCategory, FailureFrequency, FailurePattern, JobFrequency,
    percentage,
};
pub use build_report::{
    AsanFinding, BuildReport, BuildStatus, FailedJob, FailureKey, FailureSignature, JobRef,
    TestFailure,
};
pub use classification::{Classification, ClassifiedFailure, FailureDiff};
