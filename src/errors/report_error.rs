use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while serializing benchmark reports.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to write report file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize JSON report '{}': {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
