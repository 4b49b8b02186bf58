//! Timing harness: repeated fenced invocations, outlier-filtered estimate,
//! then correctness and overrun checks on the produced output.

use std::sync::atomic::{Ordering, compiler_fence};
use std::time::Instant;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::errors::{HarnessError, HarnessResult};
use crate::estimator::{DEFAULT_DEVIATION_THRESHOLD, OutlierFilteringEstimator};
use crate::guarded_buffer::GuardedBuffer;
use crate::kernel::{Dataset, Kernel, KernelArgs, Parallelism};
use crate::report::{BenchmarkReport, Verdict};

/// Untimed invocations executed before sampling starts.
pub const DEFAULT_WARMUP_INVOCATIONS: u32 = 5;

/// Sampling parameters of a [`TimingHarness`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Number of raw duration samples.
    pub sample_count: usize,
    /// Back-to-back kernel calls averaged into one sample.
    pub invocations_per_sample: u32,
    /// `nstd` of the outlier filter.
    pub deviation_threshold: u32,
    pub warmup_invocations: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            sample_count: 1000,
            invocations_per_sample: 16,
            deviation_threshold: DEFAULT_DEVIATION_THRESHOLD,
            warmup_invocations: DEFAULT_WARMUP_INVOCATIONS,
        }
    }
}

/// Runs kernels and turns their timings into a [`BenchmarkReport`].
#[derive(Debug, Clone)]
pub struct TimingHarness {
    config: TimingConfig,
    estimator: OutlierFilteringEstimator,
}

impl TimingHarness {
    pub fn new(config: TimingConfig) -> HarnessResult<Self> {
        if config.sample_count == 0 {
            return Err(HarnessError::invalid(
                "sample_count",
                "at least one sample is required",
            ));
        }
        if config.invocations_per_sample == 0 {
            return Err(HarnessError::invalid(
                "invocations_per_sample",
                "at least one invocation per sample is required",
            ));
        }
        let estimator = OutlierFilteringEstimator::new(config.deviation_threshold)?;

        Ok(Self { config, estimator })
    }

    pub fn config(&self) -> &TimingConfig {
        &self.config
    }

    /// Collects `sample_count` durations of `invocation`, in nanoseconds per
    /// call, after the configured warm-up.
    ///
    /// Each sample brackets `invocations_per_sample` calls between two clock
    /// reads, with a compiler fence just inside each read so the calls are not
    /// moved across them.
    pub fn measure<F>(&self, mut invocation: F) -> HarnessResult<Vec<u64>>
    where
        F: FnMut() -> HarnessResult<()>,
    {
        for _ in 0..self.config.warmup_invocations {
            invocation()?;
        }

        let sample_count = self.config.sample_count;
        let invocations = self.config.invocations_per_sample;
        let progress_step = (sample_count / 10).max(1);
        let mut samples = Vec::with_capacity(sample_count);

        for i in 0..sample_count {
            let start = Instant::now();
            compiler_fence(Ordering::SeqCst);
            for _ in 0..invocations {
                invocation()?;
            }
            compiler_fence(Ordering::SeqCst);
            let elapsed = start.elapsed();

            let per_call = elapsed.as_nanos() / invocations as u128;
            samples.push(u64::try_from(per_call).unwrap_or(u64::MAX));

            if (i + 1) % progress_step == 0 {
                debug!("  Progress: {}/{}", i + 1, sample_count);
            }
        }

        Ok(samples)
    }

    /// Benchmarks `kernel` on `dataset`.
    ///
    /// The output lives in a [`GuardedBuffer`] allocated before any timing;
    /// after sampling it is compared to the dataset's reference and its guard
    /// is checked. Mismatches and overruns end up in the report's verdict,
    /// they are not errors.
    pub fn run<D: Dataset>(
        &self,
        kernel: &dyn Kernel<D>,
        dataset: &D,
        parallelism: Parallelism,
    ) -> HarnessResult<BenchmarkReport> {
        if parallelism.threads == 0 {
            return Err(HarnessError::invalid(
                "threads",
                "thread count must be at least 1",
            ));
        }
        if dataset.reference().len() != dataset.len() {
            return Err(HarnessError::invalid(
                "dataset",
                format!(
                    "reference holds {} elements but the dataset has {}",
                    dataset.reference().len(),
                    dataset.len()
                ),
            ));
        }

        let mut output = GuardedBuffer::<D::Output>::allocate(dataset.len())?;

        info!(
            "Benchmarking {} ({} samples x {} invocations, {} thread(s) from CPU {})...",
            kernel.label(),
            self.config.sample_count,
            self.config.invocations_per_sample,
            parallelism.threads,
            parallelism.base_cpu
        );

        let raw_durations_ns = self.measure(|| {
            kernel.run(KernelArgs::new(
                dataset,
                output.as_mut_slice(),
                parallelism,
            ))
        })?;

        let estimate = self.estimator.estimate(&raw_durations_ns)?;

        let verdict = Verdict::from_checks(output.matches(dataset.reference()), output.check_guard());
        if verdict.is_success() {
            info!(
                "{} [{}] trimmed mean {} ns over {}/{} samples: {}",
                kernel.label(),
                verdict.label(),
                estimate.trimmed_mean_ns,
                estimate.active_count,
                estimate.sample_count,
                verdict
            );
        } else {
            warn!(
                "{} [{}] trimmed mean {} ns: {}",
                kernel.label(),
                verdict.label(),
                estimate.trimmed_mean_ns,
                verdict
            );
        }

        Ok(BenchmarkReport {
            implementation: kernel.label().to_string(),
            run_count: raw_durations_ns.len(),
            invocations_per_sample: self.config.invocations_per_sample,
            trimmed_mean_ns: estimate.trimmed_mean_ns,
            raw_durations_ns,
            verdict,
            estimate,
        })
    }
}
