//! Runs the implementations of a workload family on one shared dataset.

use log::{error, info};

use crate::config::BenchConfig;
use crate::errors::HarnessResult;
use crate::harness::TimingHarness;
use crate::kernel::{Dataset, Parallelism};
use crate::registry::KernelRegistry;
use crate::report::BenchmarkReport;
use crate::workloads::{
    BlackScholesDataset, ByteCopyDataset, Family, VectorAddDataset, black_scholes, byte_copy,
    vector_add,
};

/// Selects every implementation of a family.
pub const ALL_IMPLEMENTATIONS: &str = "all";

/// Main benchmark runner
pub struct BenchmarkRunner {
    config: BenchConfig,
    parallelism: Parallelism,
}

impl BenchmarkRunner {
    pub fn new(config: &BenchConfig) -> HarnessResult<Self> {
        for family in Family::ALL {
            TimingHarness::new(config.timing(family))?;
        }
        Ok(Self {
            config: config.clone(),
            parallelism: config.parallelism(),
        })
    }

    /// Harness configured for `family`.
    pub fn harness(&self, family: Family) -> HarnessResult<TimingHarness> {
        TimingHarness::new(self.config.timing(family))
    }

    /// Generates the family's dataset and benchmarks `selection`, a short
    /// name, a label or [`ALL_IMPLEMENTATIONS`].
    pub fn run_family(&self, family: Family, selection: &str) -> HarnessResult<Vec<BenchmarkReport>> {
        let harness = self.harness(family)?;
        let size = self.config.dataset_size;
        let seed = self.config.seed;

        info!("{}", "=".repeat(80));
        info!(
            "{}: {} elements, seed {:#x}, nstd {}",
            family.description(),
            size,
            seed,
            harness.config().deviation_threshold
        );
        info!("{}", "=".repeat(80));

        match family {
            Family::VectorAdd => {
                let dataset = VectorAddDataset::generate(size, seed);
                self.run_selection(&harness, &vector_add::kernels(), &dataset, selection)
            }
            Family::ByteCopy => {
                let dataset = ByteCopyDataset::generate(size, seed);
                self.run_selection(&harness, &byte_copy::kernels(), &dataset, selection)
            }
            Family::BlackScholes => {
                let dataset = BlackScholesDataset::generate(size, seed);
                self.run_selection(&harness, &black_scholes::kernels(), &dataset, selection)
            }
        }
    }

    /// Benchmarks the selected kernels of `registry` on `dataset` with
    /// `harness`, in registration order. Stops at the first failing
    /// implementation.
    pub fn run_selection<D: Dataset>(
        &self,
        harness: &TimingHarness,
        registry: &KernelRegistry<D>,
        dataset: &D,
        selection: &str,
    ) -> HarnessResult<Vec<BenchmarkReport>> {
        let kernels = if selection == ALL_IMPLEMENTATIONS {
            registry.kernels().to_vec()
        } else {
            vec![registry.get(selection)?]
        };

        let mut reports = Vec::with_capacity(kernels.len());
        for kernel in kernels {
            match harness.run(kernel.as_ref(), dataset, self.parallelism) {
                Ok(report) => reports.push(report),
                Err(e) => {
                    error!("Benchmark of {} failed: {}", kernel.label(), e);
                    return Err(e);
                }
            }
        }

        info!("{} implementation(s) benchmarked", reports.len());
        Ok(reports)
    }

    /// List available workloads and implementations
    pub fn list_implementations() {
        println!("Available workloads:");
        for family in Family::ALL {
            let implementations: Vec<String> = family
                .implementation_names()
                .into_iter()
                .zip(family.implementation_labels())
                .map(|(name, label)| format!("{} ({})", name, label))
                .collect();
            println!(
                "  {:<13} - {} [{}]",
                family.name(),
                family.description(),
                implementations.join(", ")
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::HarnessError;

    fn small_config() -> BenchConfig {
        BenchConfig {
            threads: 2,
            sample_count: 5,
            invocations_per_sample: 2,
            warmup_invocations: 1,
            dataset_size: 64,
            ..Default::default()
        }
    }

    #[test]
    fn test_run_all_in_registry_order() {
        let runner = BenchmarkRunner::new(&small_config()).unwrap();
        let reports = runner.run_family(Family::ByteCopy, ALL_IMPLEMENTATIONS).unwrap();
        let labels: Vec<&str> = reports.iter().map(|r| r.implementation.as_str()).collect();
        assert_eq!(labels, vec!["scalar_naive", "scalar_opt", "parallelized"]);
        assert!(reports.iter().all(|r| r.verdict.is_success()));
    }

    #[test]
    fn test_single_selection_by_label() {
        let runner = BenchmarkRunner::new(&small_config()).unwrap();
        let reports = runner.run_family(Family::VectorAdd, "vectorized").unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].run_count, 5);
    }

    #[test]
    fn test_byte_copy_uses_tighter_threshold() {
        let runner = BenchmarkRunner::new(&small_config()).unwrap();
        assert_eq!(
            runner.harness(Family::ByteCopy).unwrap().config().deviation_threshold,
            2
        );
        assert_eq!(
            runner.harness(Family::VectorAdd).unwrap().config().deviation_threshold,
            3
        );

        let overridden = BenchConfig {
            deviation_threshold: Some(5),
            ..small_config()
        };
        let runner = BenchmarkRunner::new(&overridden).unwrap();
        assert_eq!(
            runner.harness(Family::ByteCopy).unwrap().config().deviation_threshold,
            5
        );
    }

    #[test]
    fn test_unknown_selection() {
        let runner = BenchmarkRunner::new(&small_config()).unwrap();
        let result = runner.run_family(Family::BlackScholes, "vec");
        assert!(matches!(
            result,
            Err(HarnessError::UnknownImplementation { .. })
        ));
    }
}
