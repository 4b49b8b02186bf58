//! Tests for error types of the benchmark harness.

use kernbench::errors::{AffinityError, BenchError, ConfigError, HarnessError, ReportError};
use kernbench::estimator::OutlierFilteringEstimator;
use kernbench::workloads::Family;
use kernbench::{BenchConfig, BenchmarkRunner};

#[test]
fn test_all_samples_rejected_message() {
    let err = OutlierFilteringEstimator::new(1)
        .unwrap()
        .estimate(&[0, 2])
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "All 2 samples were rejected as outliers after 1 statistics rounds"
    );
}

#[test]
fn test_unknown_implementation_lists_alternatives() {
    let runner = BenchmarkRunner::new(&BenchConfig {
        sample_count: 1,
        dataset_size: 4,
        ..Default::default()
    })
    .unwrap();
    let err = runner.run_family(Family::ByteCopy, "vec").unwrap_err();
    assert_eq!(
        err.to_string(),
        r#"Unknown implementation 'vec', available: ["naive", "opt", "para"]"#
    );
}

#[test]
fn test_worker_errors_keep_their_source() {
    let err = HarnessError::WorkerCreationFailure {
        worker: 3,
        source: std::io::Error::other("resource temporarily unavailable"),
    };
    assert!(err.to_string().starts_with("Failed to spawn worker thread 3"));
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn test_bench_error_is_transparent() {
    let err: BenchError = ConfigError::Validation {
        field: "threads".to_string(),
        message: "Thread count must be greater than 0".to_string(),
    }
    .into();
    assert_eq!(
        err.to_string(),
        "Configuration validation error for field 'threads': Thread count must be greater than 0"
    );

    let err: BenchError = HarnessError::WorkerPanicked { worker: 2 }.into();
    assert!(matches!(err, BenchError::Harness(HarnessError::WorkerPanicked { worker: 2 })));
}

#[test]
fn test_report_and_affinity_messages() {
    let err = ReportError::Io {
        path: "out/x.csv".into(),
        source: std::io::Error::other("denied"),
    };
    assert_eq!(err.to_string(), "Failed to write report file 'out/x.csv': denied");

    let err = AffinityError::CpuOutOfRange { cpu: 4096, max: 1024 };
    assert_eq!(
        err.to_string(),
        "CPU 4096 is outside the supported CPU set size 1024"
    );
}
