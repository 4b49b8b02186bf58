//! Error types for the benchmark execution core.

use thiserror::Error;

/// Errors that abort a benchmark run.
///
/// Guard violations and value mismatches are not errors: they are reported
/// in the run's [`Verdict`](crate::report::Verdict).
#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Failed to allocate a guarded buffer of {bytes} bytes")]
    AllocationFailure { bytes: usize },

    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Failed to spawn worker thread {worker}: {source}")]
    WorkerCreationFailure {
        worker: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("Worker thread {worker} panicked during parallel execution")]
    WorkerPanicked { worker: usize },

    #[error("All {sample_count} samples were rejected as outliers after {rounds} statistics rounds")]
    AllSamplesRejected { sample_count: usize, rounds: usize },

    #[error("Unknown implementation '{name}', available: {available:?}")]
    UnknownImplementation {
        name: String,
        available: Vec<String>,
    },
}

impl HarnessError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        HarnessError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
