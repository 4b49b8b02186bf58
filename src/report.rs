//! Benchmark reports and their serialization.

use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::info;
use serde::Serialize;

use crate::errors::{ReportError, ReportResult};
use crate::estimator::Estimate;

/// Correctness outcome of a benchmark run: value match and guard integrity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    MatchGuardOk,
    MatchGuardFail,
    MismatchGuardOk,
    MismatchGuardFail,
}

impl Verdict {
    pub fn from_checks(matched: bool, guard_ok: bool) -> Self {
        match (matched, guard_ok) {
            (true, true) => Verdict::MatchGuardOk,
            (true, false) => Verdict::MatchGuardFail,
            (false, true) => Verdict::MismatchGuardOk,
            (false, false) => Verdict::MismatchGuardFail,
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, Verdict::MatchGuardOk | Verdict::MatchGuardFail)
    }

    pub fn guard_ok(&self) -> bool {
        matches!(self, Verdict::MatchGuardOk | Verdict::MismatchGuardOk)
    }

    pub fn is_success(&self) -> bool {
        *self == Verdict::MatchGuardOk
    }

    /// Fixed-width label of the value check.
    pub fn label(&self) -> &'static str {
        if self.is_match() { "   MATCH" } else { "NO MATCH" }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Verdict::MatchGuardOk => "Success",
            Verdict::MatchGuardFail => "Success, but failed buffer overruns check",
            Verdict::MismatchGuardOk => "Fail, but no buffer overruns",
            Verdict::MismatchGuardFail => "Failed, and failed buffer overruns check",
        };
        f.write_str(text)
    }
}

/// Everything measured for one implementation.
#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkReport {
    /// Long label of the implementation (`scalar_naive`, `parallelized`, ...).
    pub implementation: String,
    pub run_count: usize,
    pub invocations_per_sample: u32,
    pub raw_durations_ns: Vec<u64>,
    pub trimmed_mean_ns: u64,
    pub verdict: Verdict,
    pub estimate: Estimate,
}

impl BenchmarkReport {
    pub fn trimmed_mean_ms(&self) -> f64 {
        self.trimmed_mean_ns as f64 / 1_000_000.0
    }

    /// How many times faster this run is than `baseline`.
    pub fn speedup_vs(&self, baseline: &BenchmarkReport) -> f64 {
        if self.trimmed_mean_ns == 0 {
            return 0.0;
        }
        baseline.trimmed_mean_ns as f64 / self.trimmed_mean_ns as f64
    }

    pub fn csv_file_name(&self) -> String {
        format!("{}_runtimes.csv", self.implementation)
    }
}

/// Writes `<dir>/<implementation>_runtimes.csv`:
///
/// ```text
/// impl,scalar_naive
/// num_of_runs,3
/// runtimes,120,118,131
/// avg,123
/// ```
pub fn write_runtimes_csv(report: &BenchmarkReport, dir: &Path) -> ReportResult<PathBuf> {
    fs::create_dir_all(dir).map_err(|source| ReportError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let path = dir.join(report.csv_file_name());
    write_runtimes(report, &path).map_err(|source| ReportError::Io {
        path: path.clone(),
        source,
    })?;

    info!("Wrote raw runtimes to {}", path.display());
    Ok(path)
}

fn write_runtimes(report: &BenchmarkReport, path: &Path) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "impl,{}", report.implementation)?;
    writeln!(writer, "num_of_runs,{}", report.run_count)?;
    write!(writer, "runtimes")?;
    for duration in &report.raw_durations_ns {
        write!(writer, ",{}", duration)?;
    }
    writeln!(writer)?;
    writeln!(writer, "avg,{}", report.trimmed_mean_ns)?;
    writer.flush()
}

/// Writes all reports as a pretty-printed JSON array.
pub fn write_json(reports: &[BenchmarkReport], path: &Path) -> ReportResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ReportError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let file = File::create(path).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, reports).map_err(|source| ReportError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    writer.flush().map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    info!("Wrote {} report(s) to {}", reports.len(), path.display());
    Ok(())
}

/// Prints per-implementation results followed by a fastest-to-slowest
/// ranking. The first report is the baseline for relative numbers.
pub fn print_performance_analysis(reports: &[BenchmarkReport]) {
    let Some(baseline) = reports.first() else {
        return;
    };

    println!("\n{}", "=".repeat(80));
    println!("Detailed Results");
    println!("{}", "=".repeat(80));

    for report in reports {
        println!("\n{} [{}] {}", report.implementation, report.verdict.label(), report.verdict);
        println!(
            "   Trimmed mean: {:.3} ms ({} ns)",
            report.trimmed_mean_ms(),
            report.trimmed_mean_ns
        );
        println!(
            "   Stddev: {:.1} ns, range {}..{} ns",
            report.estimate.stddev_ns, report.estimate.min_ns, report.estimate.max_ns
        );
        println!(
            "   Samples kept: {}/{} after {} round(s)",
            report.estimate.active_count,
            report.run_count,
            report.estimate.rounds.len()
        );

        if report.implementation != baseline.implementation {
            println!(
                "   Speedup vs {}: {:.2}x",
                baseline.implementation,
                report.speedup_vs(baseline)
            );
        }
    }

    if reports.len() < 2 {
        return;
    }

    println!("\n{}", "=".repeat(80));
    println!("Performance Analysis");
    println!("{}", "=".repeat(80));

    println!("\nSpeed rankings (fastest to slowest):");
    let mut sorted: Vec<&BenchmarkReport> = reports.iter().collect();
    sorted.sort_by_key(|r| r.trimmed_mean_ns);

    for (i, report) in sorted.iter().enumerate() {
        println!(
            "   {}. {}: {:.3} ms ({:.2}x vs {})",
            i + 1,
            report.implementation,
            report.trimmed_mean_ms(),
            report.speedup_vs(baseline),
            baseline.implementation
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_strings() {
        assert_eq!(Verdict::from_checks(true, true).to_string(), "Success");
        assert_eq!(
            Verdict::from_checks(false, true).to_string(),
            "Fail, but no buffer overruns"
        );
        assert_eq!(
            Verdict::from_checks(true, false).to_string(),
            "Success, but failed buffer overruns check"
        );
        assert_eq!(
            Verdict::from_checks(false, false).to_string(),
            "Failed, and failed buffer overruns check"
        );
    }

    #[test]
    fn test_verdict_flags() {
        let verdict = Verdict::MatchGuardFail;
        assert!(verdict.is_match());
        assert!(!verdict.guard_ok());
        assert!(!verdict.is_success());
        assert_eq!(verdict.label(), "   MATCH");
        assert_eq!(Verdict::MismatchGuardOk.label(), "NO MATCH");
    }
}
