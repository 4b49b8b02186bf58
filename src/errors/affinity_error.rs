use thiserror::Error;

/// Failures to bind a thread or the process to CPUs.
///
/// These only degrade timing quality; callers log them and carry on.
#[derive(Error, Debug)]
pub enum AffinityError {
    #[error("CPU {cpu} is outside the supported CPU set size {max}")]
    CpuOutOfRange { cpu: usize, max: usize },

    #[error("Failed to set affinity to CPU {cpu}: {source}")]
    SetAffinity {
        cpu: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("CPU affinity is not supported on this platform (requested CPU {cpu})")]
    Unsupported { cpu: usize },
}
