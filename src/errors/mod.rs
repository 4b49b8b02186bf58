//! Error types for the benchmark harness.
//!
//! Each area of the crate has its own error enum so callers can match on
//! the failures they care about without going through a generic wrapper.
//! [`BenchError`] joins them for the command line front end.

mod affinity_error;
mod config_error;
mod harness_error;
mod report_error;

use thiserror::Error;

pub use affinity_error::AffinityError;
pub use config_error::ConfigError;
pub use harness_error::HarnessError;
pub use report_error::ReportError;

/// Result type alias for the benchmark execution core.
pub type HarnessResult<T> = std::result::Result<T, HarnessError>;

/// Result type alias for configuration loading.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for affinity operations.
pub type AffinityResult<T> = std::result::Result<T, AffinityError>;

/// Result type alias for report serialization.
pub type ReportResult<T> = std::result::Result<T, ReportError>;

/// Any failure the command line front end can hit.
#[derive(Error, Debug)]
pub enum BenchError {
    #[error(transparent)]
    Harness(#[from] HarnessError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Report(#[from] ReportError),
}

pub type BenchResult<T> = std::result::Result<T, BenchError>;
