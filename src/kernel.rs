//! Kernel and dataset abstractions shared by every workload.

use std::ops::Range;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::errors::HarnessResult;
use crate::guarded_buffer::Element;
use crate::parallel_executor::execute_chunks;
use crate::partition::partition;

/// Inputs of one benchmark together with the expected output.
///
/// The output has `len()` elements; element `i` of the output depends only on
/// element `i` of the inputs, which is what lets kernels work on any
/// sub-range.
pub trait Dataset: Send + Sync {
    type Output: Element;

    /// Number of output elements.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Output produced by the scalar reference routine.
    fn reference(&self) -> &[Self::Output];
}

/// Thread count and first CPU handed to a kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parallelism {
    pub threads: usize,
    pub base_cpu: usize,
}

impl Default for Parallelism {
    fn default() -> Self {
        Self::single(0)
    }
}

impl Parallelism {
    /// One thread on `cpu`.
    pub fn single(cpu: usize) -> Self {
        Self {
            threads: 1,
            base_cpu: cpu,
        }
    }

    pub fn new(threads: usize, base_cpu: usize) -> Self {
        Self { threads, base_cpu }
    }
}

/// Arguments of one kernel invocation.
///
/// `output` covers the dataset elements `offset..offset + output.len()`.
pub struct KernelArgs<'a, D: Dataset> {
    pub inputs: &'a D,
    pub output: &'a mut [D::Output],
    pub offset: usize,
    pub parallelism: Parallelism,
}

impl<'a, D: Dataset> KernelArgs<'a, D> {
    /// Arguments covering the whole dataset.
    pub fn new(inputs: &'a D, output: &'a mut [D::Output], parallelism: Parallelism) -> Self {
        Self {
            inputs,
            output,
            offset: 0,
            parallelism,
        }
    }

    /// Dataset elements this invocation is responsible for.
    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.output.len()
    }
}

/// A benchmarkable implementation of a workload.
///
/// Implementations must only write `args.output` and must be safe to call
/// concurrently on disjoint ranges.
pub trait Kernel<D: Dataset>: Send + Sync {
    /// Short name used to select the kernel (`naive`, `opt`, ...).
    fn name(&self) -> &'static str;

    /// Long label used in reports and file names.
    fn label(&self) -> &'static str;

    fn run(&self, args: KernelArgs<'_, D>) -> HarnessResult<()>;
}

pub type DynKernel<D> = Arc<dyn Kernel<D>>;

/// Multi-threaded wrapper around a sequential kernel.
///
/// The output range is split by [`partition`] and every chunk is handed to
/// the inner kernel on its own pinned worker, the first one on the calling
/// thread.
pub struct ParallelKernel<K> {
    inner: K,
    name: &'static str,
    label: &'static str,
}

impl<K> ParallelKernel<K> {
    pub fn new(inner: K, name: &'static str, label: &'static str) -> Self {
        Self { inner, name, label }
    }

    pub fn inner(&self) -> &K {
        &self.inner
    }
}

impl<D, K> Kernel<D> for ParallelKernel<K>
where
    D: Dataset,
    K: Kernel<D>,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn label(&self) -> &'static str {
        self.label
    }

    fn run(&self, args: KernelArgs<'_, D>) -> HarnessResult<()> {
        let KernelArgs {
            inputs,
            output,
            offset,
            parallelism,
        } = args;
        let chunks = partition(output.len(), parallelism.threads, parallelism.base_cpu)?;

        execute_chunks(&chunks, output, |chunk, slice| {
            self.inner.run(KernelArgs {
                inputs,
                output: slice,
                offset: offset + chunk.start,
                parallelism: Parallelism::single(chunk.cpu),
            })
        })
    }
}
