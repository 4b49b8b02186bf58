//! Micro-benchmark harness for small numeric kernels.
//!
//! This library runs a kernel many times, reduces the raw per-call durations
//! to an outlier-filtered mean, and checks the produced output against a
//! reference and against buffer overruns. Parallel kernels split their range
//! across CPU-pinned scoped threads, with the calling thread taking part.

pub mod affinity;
pub mod config;
pub mod errors;
pub mod estimator;
pub mod guarded_buffer;
pub mod harness;
pub mod kernel;
pub mod parallel_executor;
pub mod partition;
pub mod registry;
pub mod report;
pub mod runner;
pub mod workloads;

pub use config::{BenchConfig, ConfigLoader, DatasetPreset};
pub use errors::{BenchError, BenchResult, HarnessError, HarnessResult};
pub use estimator::{Estimate, OutlierFilter, OutlierFilteringEstimator};
pub use guarded_buffer::{GuardedBuffer, check_match};
pub use harness::{TimingConfig, TimingHarness};
pub use kernel::{Dataset, Kernel, KernelArgs, ParallelKernel, Parallelism};
pub use partition::{WorkChunk, partition};
pub use registry::KernelRegistry;
pub use report::{BenchmarkReport, Verdict};
pub use runner::BenchmarkRunner;
pub use workloads::Family;
