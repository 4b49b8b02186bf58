use kernbench::errors::{HarnessError, HarnessResult};
use kernbench::workloads::VectorAddDataset;
use kernbench::workloads::vector_add;
use kernbench::{Dataset, Kernel, KernelArgs, Parallelism, TimingConfig, TimingHarness, Verdict};

fn quick_harness() -> TimingHarness {
    TimingHarness::new(TimingConfig {
        sample_count: 8,
        invocations_per_sample: 2,
        deviation_threshold: 3,
        warmup_invocations: 1,
    })
    .expect("harness config is valid")
}

/// Writes the right values, then one extra element past its range.
struct OverrunningAdd;

impl Kernel<VectorAddDataset> for OverrunningAdd {
    fn name(&self) -> &'static str {
        "overrun"
    }

    fn label(&self) -> &'static str {
        "overrun"
    }

    fn run(&self, mut args: KernelArgs<'_, VectorAddDataset>) -> HarnessResult<()> {
        let range = args.range();
        let len = args.output.len();
        let lhs = &args.inputs.lhs()[range.clone()];
        let rhs = &args.inputs.rhs()[range];
        let dst = args.output.as_mut_ptr();
        for i in 0..len {
            unsafe { *dst.add(i) = lhs[i].wrapping_add(rhs[i]) };
        }
        // Lands on the guard bytes of the harness allocation.
        unsafe { *(dst.add(len) as *mut u8) = 0 };
        Ok(())
    }
}

/// Leaves the output untouched.
struct IdleKernel;

impl Kernel<VectorAddDataset> for IdleKernel {
    fn name(&self) -> &'static str {
        "idle"
    }

    fn label(&self) -> &'static str {
        "idle"
    }

    fn run(&self, _args: KernelArgs<'_, VectorAddDataset>) -> HarnessResult<()> {
        Ok(())
    }
}

struct FailingKernel;

impl Kernel<VectorAddDataset> for FailingKernel {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn label(&self) -> &'static str {
        "failing"
    }

    fn run(&self, _args: KernelArgs<'_, VectorAddDataset>) -> HarnessResult<()> {
        Err(HarnessError::WorkerPanicked { worker: 1 })
    }
}

#[test]
fn test_every_vector_add_kernel_succeeds() {
    let harness = quick_harness();
    let dataset = VectorAddDataset::generate(4096, 0xdeadbeef);

    for kernel in vector_add::kernels().kernels() {
        let report = harness
            .run(kernel.as_ref(), &dataset, Parallelism::new(4, 0))
            .expect("run should succeed");
        assert_eq!(report.verdict, Verdict::MatchGuardOk, "{}", report.implementation);
        assert_eq!(report.run_count, 8);
        assert_eq!(report.raw_durations_ns.len(), 8);
        assert_eq!(report.trimmed_mean_ns, report.estimate.trimmed_mean_ns);
    }
}

#[test]
fn test_verdicts_are_deterministic_across_runs() {
    let harness = quick_harness();
    let registry = vector_add::kernels();
    let para = registry.get("para").unwrap();

    let verdicts: Vec<Verdict> = (0..3)
        .map(|_| {
            let dataset = VectorAddDataset::generate(1001, 7);
            harness
                .run(para.as_ref(), &dataset, Parallelism::new(3, 1))
                .unwrap()
                .verdict
        })
        .collect();

    assert!(verdicts.iter().all(|v| *v == Verdict::MatchGuardOk));
}

#[test]
fn test_overrun_is_reported_in_verdict() {
    let dataset = VectorAddDataset::generate(32, 1);
    let report = quick_harness()
        .run(&OverrunningAdd, &dataset, Parallelism::default())
        .unwrap();
    assert_eq!(report.verdict, Verdict::MatchGuardFail);
    assert_eq!(
        report.verdict.to_string(),
        "Success, but failed buffer overruns check"
    );
}

#[test]
fn test_mismatch_is_reported_in_verdict() {
    let dataset = VectorAddDataset::from_vectors(vec![1, 2, 3], vec![4, 5, 6]).unwrap();
    let report = quick_harness()
        .run(&IdleKernel, &dataset, Parallelism::default())
        .unwrap();
    assert_eq!(report.verdict, Verdict::MismatchGuardOk);
    assert_eq!(report.verdict.label(), "NO MATCH");
}

#[test]
fn test_kernel_errors_abort_the_run() {
    let dataset = VectorAddDataset::generate(8, 1);
    let result = quick_harness().run(&FailingKernel, &dataset, Parallelism::default());
    assert!(matches!(result, Err(HarnessError::WorkerPanicked { worker: 1 })));
}

#[test]
fn test_zero_threads_rejected_before_running() {
    let dataset = VectorAddDataset::generate(8, 1);
    let result = quick_harness().run(&IdleKernel, &dataset, Parallelism::new(0, 0));
    assert!(matches!(result, Err(HarnessError::InvalidParameter { .. })));
    assert_eq!(dataset.len(), 8);
}
