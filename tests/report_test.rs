use std::fs;

use kernbench::config::{BenchConfig, ConfigLoader};
use kernbench::errors::ConfigError;
use kernbench::estimator::OutlierFilteringEstimator;
use kernbench::report::{BenchmarkReport, Verdict, write_json, write_runtimes_csv};
use kernbench::workloads::Family;
use tempfile::TempDir;

fn sample_report(implementation: &str, durations: Vec<u64>) -> BenchmarkReport {
    let estimate = OutlierFilteringEstimator::new(3)
        .unwrap()
        .estimate(&durations)
        .unwrap();
    BenchmarkReport {
        implementation: implementation.to_string(),
        run_count: durations.len(),
        invocations_per_sample: 16,
        trimmed_mean_ns: estimate.trimmed_mean_ns,
        raw_durations_ns: durations,
        verdict: Verdict::MatchGuardOk,
        estimate,
    }
}

#[test]
fn test_runtimes_csv_layout() {
    let dir = TempDir::new().unwrap();
    let report = sample_report("scalar_naive", vec![120, 118, 131]);

    let path = write_runtimes_csv(&report, dir.path()).expect("csv should be written");

    assert_eq!(path, dir.path().join("scalar_naive_runtimes.csv"));
    let content = fs::read_to_string(&path).unwrap();
    assert_eq!(
        content,
        "impl,scalar_naive\nnum_of_runs,3\nruntimes,120,118,131\navg,123\n"
    );
}

#[test]
fn test_csv_creates_missing_directory() {
    let dir = TempDir::new().unwrap();
    let nested = dir.path().join("out").join("vvadd");
    let report = sample_report("vectorized", vec![5]);
    let path = write_runtimes_csv(&report, &nested).unwrap();
    assert!(path.exists());
}

#[test]
fn test_json_report_contains_every_run() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("reports.json");
    let reports = vec![
        sample_report("scalar_naive", vec![10, 12, 11]),
        sample_report("parallelized", vec![4, 5, 4]),
    ];

    write_json(&reports, &path).unwrap();

    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    let array = value.as_array().expect("top level array");
    assert_eq!(array.len(), 2);
    assert_eq!(array[1]["implementation"], "parallelized");
    assert_eq!(array[0]["verdict"], "match_guard_ok");
    assert_eq!(array[0]["raw_durations_ns"].as_array().unwrap().len(), 3);
}

#[test]
fn test_missing_config_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let config: BenchConfig = ConfigLoader::load_config(&dir.path().join("absent.json")).unwrap();
    assert_eq!(config, BenchConfig::default());
}

#[test]
fn test_config_file_values_are_used() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bench.json");
    fs::write(&path, r#"{"threads": 4, "base_cpu": 2, "deviation_threshold": 2}"#).unwrap();

    let config = ConfigLoader::load_bench_config(&path).unwrap();
    assert_eq!(config.threads, 4);
    assert_eq!(config.parallelism().base_cpu, 2);
    assert_eq!(config.deviation_threshold, Some(2));
    assert_eq!(config.timing(Family::VectorAdd).deviation_threshold, 2);
}

#[test]
fn test_invalid_config_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bench.json");

    fs::write(&path, "{ not json").unwrap();
    assert!(matches!(
        ConfigLoader::load_bench_config(&path),
        Err(ConfigError::Parse { .. })
    ));

    fs::write(&path, r#"{"invocations_per_sample": 0}"#).unwrap();
    assert!(matches!(
        ConfigLoader::load_bench_config(&path),
        Err(ConfigError::Validation { .. })
    ));
}
