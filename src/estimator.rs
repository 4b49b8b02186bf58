//! Outlier-filtered runtime estimation.
//!
//! Raw samples are reduced by repeated rounds: compute the mean and standard
//! deviation of the samples still active, mask every active sample whose
//! distance to the mean reaches `nstd` standard deviations, and repeat until a
//! round masks nothing. The mean of the surviving samples is the trimmed mean.
//!
//! A sample sitting exactly on the `nstd * stddev` boundary counts as an
//! outlier. When the active samples have zero spread nothing is masked, so a
//! constant sample set converges immediately instead of rejecting itself.

use log::debug;
use serde::Serialize;

use crate::errors::{HarnessError, HarnessResult};

/// Deviation threshold used when none is configured.
pub const DEFAULT_DEVIATION_THRESHOLD: u32 = 3;

/// Progress of an [`OutlierFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EstimatorState {
    Converging,
    Converged,
}

/// Statistics computed during one filtering round, over the samples that were
/// active when the round started.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RoundStats {
    pub mean: u64,
    pub stddev: f64,
    pub min: u64,
    pub max: u64,
    pub active_count: usize,
    pub masked_this_round: usize,
}

/// Final result of the estimation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Estimate {
    /// Mean of the samples that survived every round.
    pub trimmed_mean_ns: u64,
    /// Standard deviation of the surviving samples.
    pub stddev_ns: f64,
    pub min_ns: u64,
    pub max_ns: u64,
    /// Number of samples that survived.
    pub active_count: usize,
    /// Number of raw samples.
    pub sample_count: usize,
    pub rounds: Vec<RoundStats>,
}

/// Step-by-step outlier filter over a borrowed sample set.
///
/// Useful on its own to inspect intermediate rounds; most callers go through
/// [`OutlierFilteringEstimator::estimate`].
#[derive(Debug, Clone)]
pub struct OutlierFilter<'a> {
    samples: &'a [u64],
    mask: Vec<bool>,
    nstd: u32,
    state: EstimatorState,
    rounds: Vec<RoundStats>,
}

impl<'a> OutlierFilter<'a> {
    /// Creates a filter with every sample active.
    pub fn new(samples: &'a [u64], nstd: u32) -> HarnessResult<Self> {
        if samples.is_empty() {
            return Err(HarnessError::invalid(
                "samples",
                "at least one sample is required",
            ));
        }
        if nstd == 0 {
            return Err(HarnessError::invalid(
                "deviation_threshold",
                "deviation threshold must be greater than 0",
            ));
        }

        Ok(Self {
            samples,
            mask: vec![true; samples.len()],
            nstd,
            state: EstimatorState::Converging,
            rounds: Vec::new(),
        })
    }

    pub fn state(&self) -> EstimatorState {
        self.state
    }

    /// Active flag per sample, `false` once a sample has been masked.
    pub fn mask(&self) -> &[bool] {
        &self.mask
    }

    pub fn rounds(&self) -> &[RoundStats] {
        &self.rounds
    }

    pub fn active_count(&self) -> usize {
        self.mask.iter().filter(|&&active| active).count()
    }

    fn active_samples(&self) -> impl Iterator<Item = u64> + '_ {
        self.samples
            .iter()
            .zip(self.mask.iter())
            .filter(|(_, active)| **active)
            .map(|(&sample, _)| sample)
    }

    /// Runs one round. Returns `Ok(None)` once the filter has converged.
    ///
    /// # Errors
    /// `AllSamplesRejected` if the round masks every remaining sample.
    pub fn step(&mut self) -> HarnessResult<Option<RoundStats>> {
        if self.state == EstimatorState::Converged {
            return Ok(None);
        }

        let mut sum: u128 = 0;
        let mut count: usize = 0;
        let mut min = u64::MAX;
        let mut max = 0;
        for sample in self.active_samples() {
            sum += sample as u128;
            count += 1;
            min = min.min(sample);
            max = max.max(sample);
        }
        if count == 0 {
            return Err(HarnessError::AllSamplesRejected {
                sample_count: self.samples.len(),
                rounds: self.rounds.len(),
            });
        }

        let mean = (sum / count as u128) as u64;
        let squared: u128 = self
            .active_samples()
            .map(|sample| {
                let diff = sample.abs_diff(mean) as u128;
                diff.saturating_mul(diff)
            })
            .fold(0, u128::saturating_add);
        let stddev = (squared as f64 / count as f64).sqrt();
        let threshold = self.nstd as f64 * stddev;

        let mut masked = 0;
        if stddev > 0.0 {
            for (sample, active) in self.samples.iter().zip(self.mask.iter_mut()) {
                if *active && sample.abs_diff(mean) as f64 >= threshold {
                    *active = false;
                    masked += 1;
                }
            }
        }

        let round = RoundStats {
            mean,
            stddev,
            min,
            max,
            active_count: count,
            masked_this_round: masked,
        };
        debug!(
            "Statistics round #{}: mean = {} ns, stddev = {:.1} ns, active = {}, masked = {}",
            self.rounds.len() + 1,
            mean,
            stddev,
            count,
            masked
        );
        self.rounds.push(round);

        if masked == 0 {
            self.state = EstimatorState::Converged;
        } else if masked == count {
            return Err(HarnessError::AllSamplesRejected {
                sample_count: self.samples.len(),
                rounds: self.rounds.len(),
            });
        }

        Ok(Some(round))
    }

    /// Runs rounds until convergence and returns the estimate.
    pub fn finish(mut self) -> HarnessResult<Estimate> {
        while self.step()?.is_some() {}

        // Converged implies at least one round.
        let last = self
            .rounds
            .last()
            .copied()
            .ok_or(HarnessError::AllSamplesRejected {
                sample_count: self.samples.len(),
                rounds: 0,
            })?;

        Ok(Estimate {
            trimmed_mean_ns: last.mean,
            stddev_ns: last.stddev,
            min_ns: last.min,
            max_ns: last.max,
            active_count: last.active_count,
            sample_count: self.samples.len(),
            rounds: self.rounds,
        })
    }
}

/// Iterative outlier-rejecting estimator parameterized by the deviation
/// threshold `nstd`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutlierFilteringEstimator {
    nstd: u32,
}

impl Default for OutlierFilteringEstimator {
    fn default() -> Self {
        Self {
            nstd: DEFAULT_DEVIATION_THRESHOLD,
        }
    }
}

impl OutlierFilteringEstimator {
    /// `nstd` must be positive. Since samples on the boundary are masked, a
    /// set split evenly between two values sits exactly one stddev from its
    /// mean and is rejected entirely when `nstd == 1`.
    pub fn new(nstd: u32) -> HarnessResult<Self> {
        if nstd == 0 {
            return Err(HarnessError::invalid(
                "deviation_threshold",
                "deviation threshold must be greater than 0",
            ));
        }
        Ok(Self { nstd })
    }

    pub fn deviation_threshold(&self) -> u32 {
        self.nstd
    }

    /// Filters `samples` to convergence.
    pub fn estimate(&self, samples: &[u64]) -> HarnessResult<Estimate> {
        OutlierFilter::new(samples, self.nstd)?.finish()
    }
}
