//! Element-wise `i32` vector addition (`out[i] = lhs[i] + rhs[i]`, wrapping).

use crate::errors::{HarnessError, HarnessResult};
use crate::kernel::{Dataset, Kernel, KernelArgs, ParallelKernel};
use crate::registry::KernelRegistry;

/// Two input vectors and their element-wise sum.
#[derive(Debug, Clone)]
pub struct VectorAddDataset {
    lhs: Vec<i32>,
    rhs: Vec<i32>,
    reference: Vec<i32>,
}

impl VectorAddDataset {
    /// Random inputs drawn from `seed`.
    pub fn generate(len: usize, seed: u64) -> Self {
        let mut rng = fastrand::Rng::with_seed(seed);
        let lhs: Vec<i32> = (0..len).map(|_| rng.i32(..)).collect();
        let rhs: Vec<i32> = (0..len).map(|_| rng.i32(..)).collect();
        let reference = reference_sum(&lhs, &rhs);
        Self { lhs, rhs, reference }
    }

    pub fn from_vectors(lhs: Vec<i32>, rhs: Vec<i32>) -> HarnessResult<Self> {
        if lhs.len() != rhs.len() {
            return Err(HarnessError::invalid(
                "rhs",
                format!("expected {} elements, got {}", lhs.len(), rhs.len()),
            ));
        }
        let reference = reference_sum(&lhs, &rhs);
        Ok(Self { lhs, rhs, reference })
    }

    pub fn lhs(&self) -> &[i32] {
        &self.lhs
    }

    pub fn rhs(&self) -> &[i32] {
        &self.rhs
    }
}

fn reference_sum(lhs: &[i32], rhs: &[i32]) -> Vec<i32> {
    lhs.iter().zip(rhs).map(|(a, b)| a.wrapping_add(*b)).collect()
}

impl Dataset for VectorAddDataset {
    type Output = i32;

    fn len(&self) -> usize {
        self.reference.len()
    }

    fn reference(&self) -> &[i32] {
        &self.reference
    }
}

/// Input slices matching the output range of `args`.
fn inputs<'a>(args: &KernelArgs<'a, VectorAddDataset>) -> (&'a [i32], &'a [i32]) {
    let range = args.range();
    (&args.inputs.lhs[range.clone()], &args.inputs.rhs[range])
}

/// Plain indexed loop.
#[derive(Debug, Default, Clone, Copy)]
pub struct NaiveVectorAdd;

impl Kernel<VectorAddDataset> for NaiveVectorAdd {
    fn name(&self) -> &'static str {
        "naive"
    }

    fn label(&self) -> &'static str {
        "scalar_naive"
    }

    fn run(&self, args: KernelArgs<'_, VectorAddDataset>) -> HarnessResult<()> {
        let (lhs, rhs) = inputs(&args);
        let output = args.output;
        for i in 0..output.len() {
            output[i] = lhs[i].wrapping_add(rhs[i]);
        }
        Ok(())
    }
}

/// Scalar loop unrolled by eight.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnrolledVectorAdd;

impl Kernel<VectorAddDataset> for UnrolledVectorAdd {
    fn name(&self) -> &'static str {
        "opt"
    }

    fn label(&self) -> &'static str {
        "scalar_opt"
    }

    fn run(&self, mut args: KernelArgs<'_, VectorAddDataset>) -> HarnessResult<()> {
        let (lhs, rhs) = inputs(&args);
        let mut out_blocks = args.output.chunks_exact_mut(8);
        let mut lhs_blocks = lhs.chunks_exact(8);
        let mut rhs_blocks = rhs.chunks_exact(8);

        for ((dst, a), b) in (&mut out_blocks).zip(&mut lhs_blocks).zip(&mut rhs_blocks) {
            dst[0] = a[0].wrapping_add(b[0]);
            dst[1] = a[1].wrapping_add(b[1]);
            dst[2] = a[2].wrapping_add(b[2]);
            dst[3] = a[3].wrapping_add(b[3]);
            dst[4] = a[4].wrapping_add(b[4]);
            dst[5] = a[5].wrapping_add(b[5]);
            dst[6] = a[6].wrapping_add(b[6]);
            dst[7] = a[7].wrapping_add(b[7]);
        }

        let tail = out_blocks.into_remainder();
        for ((dst, a), b) in tail
            .iter_mut()
            .zip(lhs_blocks.remainder())
            .zip(rhs_blocks.remainder())
        {
            *dst = a.wrapping_add(*b);
        }
        Ok(())
    }
}

/// Instruction set used by [`SimdVectorAdd`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddKernel {
    Scalar,
    #[cfg(target_arch = "x86_64")]
    Avx2,
    #[cfg(target_arch = "aarch64")]
    Neon,
}

impl AddKernel {
    pub fn detect() -> Self {
        #[cfg(target_arch = "x86_64")]
        {
            if std::is_x86_feature_detected!("avx2") {
                return AddKernel::Avx2;
            }
        }
        #[cfg(target_arch = "aarch64")]
        {
            if std::arch::is_aarch64_feature_detected!("neon") {
                return AddKernel::Neon;
            }
        }

        AddKernel::Scalar
    }
}

/// SIMD addition, eight lanes with AVX2 or four with NEON, scalar tail.
#[derive(Debug, Clone, Copy)]
pub struct SimdVectorAdd {
    kernel: AddKernel,
}

impl Default for SimdVectorAdd {
    fn default() -> Self {
        Self::new()
    }
}

impl SimdVectorAdd {
    pub fn new() -> Self {
        Self {
            kernel: AddKernel::detect(),
        }
    }

    pub fn with_kernel(kernel: AddKernel) -> Self {
        Self { kernel }
    }

    pub fn kernel(&self) -> AddKernel {
        self.kernel
    }
}

impl Kernel<VectorAddDataset> for SimdVectorAdd {
    fn name(&self) -> &'static str {
        "vec"
    }

    fn label(&self) -> &'static str {
        "vectorized"
    }

    fn run(&self, mut args: KernelArgs<'_, VectorAddDataset>) -> HarnessResult<()> {
        let (lhs, rhs) = inputs(&args);
        let len = args.output.len();
        let dst = args.output.as_mut_ptr();
        match self.kernel {
            AddKernel::Scalar => unsafe { add_scalar(dst, lhs.as_ptr(), rhs.as_ptr(), len) },
            #[cfg(target_arch = "x86_64")]
            AddKernel::Avx2 => unsafe { x86_64::add_avx2(dst, lhs.as_ptr(), rhs.as_ptr(), len) },
            #[cfg(target_arch = "aarch64")]
            AddKernel::Neon => unsafe { aarch64::add_neon(dst, lhs.as_ptr(), rhs.as_ptr(), len) },
        }
        Ok(())
    }
}

unsafe fn add_scalar(dst: *mut i32, a: *const i32, b: *const i32, len: usize) {
    for i in 0..len {
        unsafe { *dst.add(i) = (*a.add(i)).wrapping_add(*b.add(i)) };
    }
}

#[cfg(target_arch = "x86_64")]
mod x86_64 {
    use core::arch::x86_64::*;

    #[target_feature(enable = "avx2")]
    pub(super) unsafe fn add_avx2(dst: *mut i32, a: *const i32, b: *const i32, len: usize) {
        let mut i = 0usize;

        while i + 8 <= len {
            let va = unsafe { _mm256_loadu_si256(a.add(i) as *const __m256i) };
            let vb = unsafe { _mm256_loadu_si256(b.add(i) as *const __m256i) };
            let sum = _mm256_add_epi32(va, vb);
            unsafe { _mm256_storeu_si256(dst.add(i) as *mut __m256i, sum) };
            i += 8;
        }

        while i < len {
            unsafe { *dst.add(i) = (*a.add(i)).wrapping_add(*b.add(i)) };
            i += 1;
        }
    }
}

#[cfg(target_arch = "aarch64")]
mod aarch64 {
    use core::arch::aarch64::*;

    #[target_feature(enable = "neon")]
    pub(super) unsafe fn add_neon(dst: *mut i32, a: *const i32, b: *const i32, len: usize) {
        let mut i = 0usize;

        while i + 4 <= len {
            let va = unsafe { vld1q_s32(a.add(i)) };
            let vb = unsafe { vld1q_s32(b.add(i)) };
            let sum = vaddq_s32(va, vb);
            unsafe { vst1q_s32(dst.add(i), sum) };
            i += 4;
        }

        while i < len {
            unsafe { *dst.add(i) = (*a.add(i)).wrapping_add(*b.add(i)) };
            i += 1;
        }
    }
}

/// Registry of every vector-add implementation, in reporting order.
pub fn kernels() -> KernelRegistry<VectorAddDataset> {
    KernelRegistry::new()
        .with(NaiveVectorAdd)
        .with(UnrolledVectorAdd)
        .with(SimdVectorAdd::new())
        .with(ParallelKernel::new(NaiveVectorAdd, "para", "parallelized"))
}
