//! Benchmark configuration: JSON file, defaults and validation.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::errors::{ConfigError, ConfigResult};
use crate::harness::{DEFAULT_WARMUP_INVOCATIONS, TimingConfig};
use crate::kernel::Parallelism;
use crate::workloads::Family;

/// Seed used for dataset generation unless overridden.
pub const DEFAULT_SEED: u64 = 0xdeadbeef;

/// Named dataset sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetPreset {
    Test,
    Dev,
    Small,
    Medium,
    Large,
    Native,
}

impl DatasetPreset {
    pub fn size(&self) -> usize {
        match self {
            DatasetPreset::Test => 4,
            DatasetPreset::Dev => 23,
            DatasetPreset::Small => 4_000,
            DatasetPreset::Medium => 16_000,
            DatasetPreset::Large => 64_000,
            DatasetPreset::Native => 10_000_000,
        }
    }
}

/// Full configuration of a benchmark session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    pub threads: usize,
    pub base_cpu: usize,
    pub sample_count: usize,
    pub invocations_per_sample: u32,
    /// Outlier threshold; `None` uses the family's own default.
    pub deviation_threshold: Option<u32>,
    pub warmup_invocations: u32,
    pub dataset_size: usize,
    pub seed: u64,
    pub output_dir: PathBuf,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            threads: 1,
            base_cpu: 0,
            sample_count: 1000,
            invocations_per_sample: 16,
            deviation_threshold: None,
            warmup_invocations: DEFAULT_WARMUP_INVOCATIONS,
            dataset_size: 1 << 20,
            seed: DEFAULT_SEED,
            output_dir: PathBuf::from("."),
        }
    }
}

impl BenchConfig {
    /// Validates the configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.threads == 0 {
            return Err(ConfigError::validation(
                "threads",
                "Thread count must be greater than 0",
            ));
        }
        if self.sample_count == 0 {
            return Err(ConfigError::validation(
                "sample_count",
                "Sample count must be greater than 0",
            ));
        }
        if self.invocations_per_sample == 0 {
            return Err(ConfigError::validation(
                "invocations_per_sample",
                "Invocations per sample must be greater than 0",
            ));
        }
        if self.deviation_threshold == Some(0) {
            return Err(ConfigError::validation(
                "deviation_threshold",
                "Deviation threshold must be greater than 0",
            ));
        }
        if self.dataset_size == 0 {
            return Err(ConfigError::validation(
                "dataset_size",
                "Dataset size must be greater than 0",
            ));
        }
        if self.base_cpu >= self.threads && self.threads > 1 {
            warn!(
                "Base CPU {} is not below the thread count {}, CPUs will wrap around",
                self.base_cpu, self.threads
            );
        }
        Ok(())
    }

    /// Sampling parameters for benchmarking `family`.
    pub fn timing(&self, family: Family) -> TimingConfig {
        TimingConfig {
            sample_count: self.sample_count,
            invocations_per_sample: self.invocations_per_sample,
            deviation_threshold: self
                .deviation_threshold
                .unwrap_or_else(|| family.default_deviation_threshold()),
            warmup_invocations: self.warmup_invocations,
        }
    }

    pub fn parallelism(&self) -> Parallelism {
        Parallelism::new(self.threads, self.base_cpu)
    }
}

/// Configuration loader that handles JSON files with fallbacks
pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads a JSON configuration, falling back to defaults when the file
    /// does not exist.
    pub fn load_config<T>(path: &Path) -> ConfigResult<T>
    where
        T: DeserializeOwned + Default,
    {
        match fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
                path: path.display().to_string(),
                source: e,
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(
                    "Config file '{}' not found, using default configuration",
                    path.display()
                );
                Ok(T::default())
            }
            Err(e) => Err(ConfigError::Io {
                path: path.display().to_string(),
                source: e,
            }),
        }
    }

    /// Loads and validates a [`BenchConfig`].
    pub fn load_bench_config(path: &Path) -> ConfigResult<BenchConfig> {
        let config: BenchConfig = Self::load_config(path)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = BenchConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.seed, 0xdeadbeef);
        assert_eq!(config.timing(Family::VectorAdd).warmup_invocations, 5);
    }

    #[test]
    fn test_deviation_threshold_follows_family_unless_set() {
        let config = BenchConfig::default();
        assert_eq!(config.timing(Family::ByteCopy).deviation_threshold, 2);
        assert_eq!(config.timing(Family::BlackScholes).deviation_threshold, 3);

        let config = BenchConfig {
            deviation_threshold: Some(4),
            ..Default::default()
        };
        assert_eq!(config.timing(Family::ByteCopy).deviation_threshold, 4);
        assert_eq!(config.timing(Family::VectorAdd).deviation_threshold, 4);

        let config = BenchConfig {
            deviation_threshold: Some(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_fields_rejected() {
        let config = BenchConfig {
            sample_count: 0,
            ..Default::default()
        };
        match config.validate() {
            Err(ConfigError::Validation { field, .. }) => assert_eq!(field, "sample_count"),
            other => panic!("expected validation error, got {:?}", other),
        }

        let config = BenchConfig {
            threads: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: BenchConfig = serde_json::from_str(r#"{"threads": 4, "seed": 7}"#).unwrap();
        assert_eq!(config.threads, 4);
        assert_eq!(config.seed, 7);
        assert_eq!(config.sample_count, BenchConfig::default().sample_count);
    }

    #[test]
    fn test_preset_sizes() {
        assert_eq!(DatasetPreset::Test.size(), 4);
        assert_eq!(DatasetPreset::Dev.size(), 23);
        assert_eq!(DatasetPreset::Native.size(), 10_000_000);
    }
}
