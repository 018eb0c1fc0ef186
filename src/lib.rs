//! CI build report extraction and cross-build aggregation engine.
//!
//! Turns rendered CI build report pages into a normalized model of jobs,
//! tests, and failure classifications, then aggregates failure frequency,
//! hung-job detection, error categories, and failure-signature clusters
//! across a backward time window of builds.

pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{AppError, AppResult};
