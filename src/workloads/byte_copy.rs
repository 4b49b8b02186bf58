//! Byte copy: the output must reproduce the source buffer.

use std::hint::black_box;

use crate::errors::HarnessResult;
use crate::kernel::{Dataset, Kernel, KernelArgs, ParallelKernel};
use crate::registry::KernelRegistry;

#[derive(Debug, Clone)]
pub struct ByteCopyDataset {
    source: Vec<u8>,
}

impl ByteCopyDataset {
    /// `len` random bytes drawn from `seed`.
    pub fn generate(len: usize, seed: u64) -> Self {
        let mut rng = fastrand::Rng::with_seed(seed);
        let mut source = vec![0u8; len];
        rng.fill(&mut source);
        Self { source }
    }

    pub fn from_bytes(source: Vec<u8>) -> Self {
        Self { source }
    }
}

impl Dataset for ByteCopyDataset {
    type Output = u8;

    fn len(&self) -> usize {
        self.source.len()
    }

    fn reference(&self) -> &[u8] {
        &self.source
    }
}

/// Byte-at-a-time loop.
#[derive(Debug, Default, Clone, Copy)]
pub struct NaiveByteCopy;

impl Kernel<ByteCopyDataset> for NaiveByteCopy {
    fn name(&self) -> &'static str {
        "naive"
    }

    fn label(&self) -> &'static str {
        "scalar_naive"
    }

    fn run(&self, mut args: KernelArgs<'_, ByteCopyDataset>) -> HarnessResult<()> {
        let source = &args.inputs.source[args.range()];
        for (dst, &byte) in args.output.iter_mut().zip(source) {
            // Keeps the loop from being turned into a memcpy call.
            *dst = black_box(byte);
        }
        Ok(())
    }
}

/// Whole-range block copy.
#[derive(Debug, Default, Clone, Copy)]
pub struct BlockByteCopy;

impl Kernel<ByteCopyDataset> for BlockByteCopy {
    fn name(&self) -> &'static str {
        "opt"
    }

    fn label(&self) -> &'static str {
        "scalar_opt"
    }

    fn run(&self, mut args: KernelArgs<'_, ByteCopyDataset>) -> HarnessResult<()> {
        let range = args.range();
        args.output.copy_from_slice(&args.inputs.source[range]);
        Ok(())
    }
}

/// Registry of every byte-copy implementation, in reporting order.
pub fn kernels() -> KernelRegistry<ByteCopyDataset> {
    KernelRegistry::new()
        .with(NaiveByteCopy)
        .with(BlockByteCopy)
        .with(ParallelKernel::new(BlockByteCopy, "para", "parallelized"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::Parallelism;

    #[test]
    fn test_every_kernel_copies() {
        let data = ByteCopyDataset::generate(1027, 0xdeadbeef);
        for kernel in kernels().kernels() {
            let mut output = vec![0u8; data.len()];
            kernel
                .run(KernelArgs::new(&data, &mut output, Parallelism::new(4, 1)))
                .unwrap();
            assert_eq!(output, data.reference(), "{}", kernel.label());
        }
    }

    #[test]
    fn test_same_seed_same_bytes() {
        let a = ByteCopyDataset::generate(16, 9);
        let b = ByteCopyDataset::generate(16, 9);
        assert_eq!(a.reference(), b.reference());
    }
}
