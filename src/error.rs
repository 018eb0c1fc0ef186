//! Domain error types for the CI build analyzer.
//!
//! Uses thiserror for ergonomic error handling with automatic Display implementations.

/// Application-level errors.
///
/// The windowed walk recovers from per-build `Parse`/`Fetch` errors locally
/// (the build is skipped); on the single-build path they are fatal and
/// surfaced as-is.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Document does not match any known report template, or a required
    /// field is structurally absent.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Transport-level failure, opaque to the analysis core.
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// The windowed walk produced zero usable reports.
    #[error("No builds found within the analysis window")]
    EmptyWindow,

    /// Invalid caller-supplied input (build number, window length, URL).
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

// Conversion implementations for common error types

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Fetch(err.to_string())
    }
}

impl From<chrono::ParseError> for AppError {
    fn from(err: chrono::ParseError) -> Self {
        AppError::Parse(format!("Invalid timestamp: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Parse(format!("JSON error: {}", err))
    }
}
