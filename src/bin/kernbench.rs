//! Command line front end: load configuration, pin the process, run the
//! selected workload and dump the reports.

use std::path::PathBuf;

use clap::Parser;
use log::{error, info, warn};

use kernbench::affinity::{process_cpu_set, restrict_process};
use kernbench::errors::BenchResult;
use kernbench::report::{print_performance_analysis, write_json, write_runtimes_csv};
use kernbench::runner::{ALL_IMPLEMENTATIONS, BenchmarkRunner};
use kernbench::{BenchConfig, ConfigLoader, DatasetPreset, Family};

#[derive(Parser, Debug)]
#[command(
    name = "kernbench",
    about = "Benchmark numeric kernels with outlier-filtered timing and overrun checks"
)]
struct Cli {
    /// Workload family to benchmark.
    #[arg(long, value_enum, default_value = "vvadd")]
    family: Family,

    /// Implementation short name or label, or `all`.
    #[arg(short = 'i', long = "impl", default_value = ALL_IMPLEMENTATIONS)]
    implementation: String,

    /// Number of worker threads for parallel implementations.
    #[arg(short = 'n', long = "nthreads")]
    threads: Option<usize>,

    /// First CPU of the worker set.
    #[arg(short = 'c', long = "cpu")]
    cpu: Option<usize>,

    /// Number of dataset elements.
    #[arg(short = 's', long, conflicts_with = "dataset")]
    size: Option<usize>,

    /// Named dataset size.
    #[arg(short = 'd', long, value_enum)]
    dataset: Option<DatasetPreset>,

    /// Number of timed samples.
    #[arg(long)]
    nruns: Option<usize>,

    /// Deviation threshold, in standard deviations, for outlier removal.
    /// Defaults to 2 for `copy` and 3 otherwise. Samples exactly on the
    /// boundary are dropped, so with 1 a set split evenly between two values
    /// is rejected as a whole.
    #[arg(long)]
    nstdevs: Option<u32>,

    /// Kernel invocations averaged into one sample.
    #[arg(long)]
    invocations: Option<u32>,

    /// Untimed invocations before sampling.
    #[arg(long)]
    warmup: Option<u32>,

    /// Dataset generation seed.
    #[arg(long)]
    seed: Option<u64>,

    /// JSON configuration file; missing files fall back to defaults.
    #[arg(long, default_value = "configs/kernbench.json")]
    config: PathBuf,

    /// Directory receiving `<impl>_runtimes.csv` files.
    #[arg(short = 'o', long = "output-dir")]
    output_dir: Option<PathBuf>,

    /// Also write every report to this JSON file.
    #[arg(long)]
    json: Option<PathBuf>,

    /// List workloads and implementations, then exit.
    #[arg(long)]
    list: bool,

    /// Do not restrict the whole process to the worker CPU set.
    #[arg(long)]
    no_process_affinity: bool,
}

impl Cli {
    fn apply_overrides(&self, config: &mut BenchConfig) {
        if let Some(threads) = self.threads {
            config.threads = threads;
        }
        if let Some(cpu) = self.cpu {
            config.base_cpu = cpu;
        }
        if let Some(preset) = self.dataset {
            config.dataset_size = preset.size();
        }
        if let Some(size) = self.size {
            config.dataset_size = size;
        }
        if let Some(nruns) = self.nruns {
            config.sample_count = nruns;
        }
        if let Some(nstdevs) = self.nstdevs {
            config.deviation_threshold = Some(nstdevs);
        }
        if let Some(invocations) = self.invocations {
            config.invocations_per_sample = invocations;
        }
        if let Some(warmup) = self.warmup {
            config.warmup_invocations = warmup;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
    }
}

fn main() {
    // Initialize logger
    env_logger::init();

    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        error!("Benchmark execution failed: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> BenchResult<()> {
    if cli.list {
        BenchmarkRunner::list_implementations();
        return Ok(());
    }

    let mut config: BenchConfig = ConfigLoader::load_config(&cli.config)?;
    cli.apply_overrides(&mut config);
    config.validate()?;

    if !cli.no_process_affinity {
        let cpus = process_cpu_set(config.threads, config.base_cpu);
        match restrict_process(&cpus) {
            Ok(()) => info!("Process restricted to CPUs {:?}", cpus),
            Err(e) => warn!("Could not restrict the process to CPUs {:?}: {}", cpus, e),
        }
    }

    let runner = BenchmarkRunner::new(&config)?;
    let reports = runner.run_family(cli.family, &cli.implementation)?;

    for report in &reports {
        write_runtimes_csv(report, &config.output_dir)?;
    }
    if let Some(path) = &cli.json {
        write_json(&reports, path)?;
    }

    print_performance_analysis(&reports);
    Ok(())
}
