//! Aligned output buffers with a trailing sentinel for overrun detection.
//!
//! Every buffer reserves `len * size_of::<T>()` logical bytes followed by
//! four guard bytes holding [`GUARD_PATTERN`]. Kernels may only write the
//! logical region; after a run [`GuardedBuffer::check_guard`] tells whether
//! the kernel stayed in bounds.

use std::alloc::{Layout, alloc_zeroed, dealloc};
use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;

use crate::errors::{HarnessError, HarnessResult};

/// Sentinel written right after the logical region (`0xdeadcafe` little-endian).
pub const GUARD_PATTERN: [u8; 4] = [0xfe, 0xca, 0xad, 0xde];

/// Number of sentinel bytes.
pub const GUARD_LEN: usize = GUARD_PATTERN.len();

/// Alignment of every guarded allocation, wide enough for 512-bit loads.
pub const BUFFER_ALIGNMENT: usize = 64;

/// Absolute tolerance used when comparing floating point outputs.
pub const FLOAT_TOLERANCE: f64 = 1e-4;

/// Element types that can live in a [`GuardedBuffer`].
///
/// # Safety
///
/// Implementors must be plain data for which the all-zero bit pattern is a
/// valid value, and their alignment must not exceed [`BUFFER_ALIGNMENT`].
pub unsafe trait Element: Copy + PartialEq + Send + Sync + fmt::Debug + 'static {
    /// Whether `candidate` is an acceptable reproduction of `reference`.
    fn matches(reference: Self, candidate: Self) -> bool;
}

macro_rules! exact_element {
    ($($ty:ty),*) => {
        $(
            unsafe impl Element for $ty {
                #[inline]
                fn matches(reference: Self, candidate: Self) -> bool {
                    reference == candidate
                }
            }
        )*
    };
}

exact_element!(u8, i8, u16, i16, u32, i32, u64, i64);

unsafe impl Element for f32 {
    #[inline]
    fn matches(reference: Self, candidate: Self) -> bool {
        ((reference - candidate).abs() as f64) < FLOAT_TOLERANCE
    }
}

unsafe impl Element for f64 {
    #[inline]
    fn matches(reference: Self, candidate: Self) -> bool {
        (reference - candidate).abs() < FLOAT_TOLERANCE
    }
}

/// Element-wise comparison of a candidate output against the reference.
///
/// Integer elements must be identical, floating point elements must be within
/// [`FLOAT_TOLERANCE`]. Stops at the first mismatch.
pub fn check_match<T: Element>(reference: &[T], candidate: &[T]) -> bool {
    if reference.len() != candidate.len() {
        return false;
    }
    reference
        .iter()
        .zip(candidate.iter())
        .all(|(&expected, &actual)| T::matches(expected, actual))
}

/// A 64-byte aligned, zero-initialized buffer of `len` elements followed by
/// [`GUARD_LEN`] sentinel bytes.
pub struct GuardedBuffer<T: Element> {
    ptr: NonNull<u8>,
    len: usize,
    layout: Layout,
    _marker: PhantomData<T>,
}

// The buffer owns its allocation exclusively, like a `Box<[T]>`.
unsafe impl<T: Element> Send for GuardedBuffer<T> {}
unsafe impl<T: Element> Sync for GuardedBuffer<T> {}

impl<T: Element> GuardedBuffer<T> {
    /// Allocates `len` zeroed elements and stamps the guard.
    pub fn allocate(len: usize) -> HarnessResult<Self> {
        let logical_bytes = len
            .checked_mul(size_of::<T>())
            .ok_or(HarnessError::AllocationFailure { bytes: usize::MAX })?;
        let total_bytes = logical_bytes
            .checked_add(GUARD_LEN)
            .ok_or(HarnessError::AllocationFailure { bytes: usize::MAX })?;
        let layout = Layout::from_size_align(total_bytes, BUFFER_ALIGNMENT)
            .map_err(|_| HarnessError::AllocationFailure { bytes: total_bytes })?;

        // The layout is never zero-sized because of the guard bytes.
        let raw = unsafe { alloc_zeroed(layout) };
        let ptr = NonNull::new(raw).ok_or(HarnessError::AllocationFailure { bytes: total_bytes })?;

        let mut buffer = Self {
            ptr,
            len,
            layout,
            _marker: PhantomData,
        };
        buffer.write_guard();
        Ok(buffer)
    }

    /// Allocates a buffer holding a copy of `values`.
    pub fn from_slice(values: &[T]) -> HarnessResult<Self> {
        let mut buffer = Self::allocate(values.len())?;
        buffer.as_mut_slice().copy_from_slice(values);
        Ok(buffer)
    }

    /// Number of logical elements.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Size of the logical region in bytes, which is also the guard offset.
    pub fn logical_bytes(&self) -> usize {
        self.len * size_of::<T>()
    }

    pub fn as_slice(&self) -> &[T] {
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr() as *const T, self.len) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr() as *mut T, self.len) }
    }

    pub fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr() as *const T
    }

    /// Raw pointer to the first element.
    ///
    /// Writes through this pointer are only sound within the logical region
    /// plus the guard bytes; anything landing on the guard is detected by
    /// [`check_guard`](Self::check_guard).
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.ptr.as_ptr() as *mut T
    }

    /// Stamps [`GUARD_PATTERN`] immediately after the logical region.
    pub fn write_guard(&mut self) {
        let offset = self.logical_bytes();
        unsafe {
            std::ptr::copy_nonoverlapping(
                GUARD_PATTERN.as_ptr(),
                self.ptr.as_ptr().add(offset),
                GUARD_LEN,
            );
        }
    }

    /// Current content of the guard bytes.
    pub fn guard_bytes(&self) -> [u8; GUARD_LEN] {
        let mut bytes = [0u8; GUARD_LEN];
        let offset = self.logical_bytes();
        unsafe {
            std::ptr::copy_nonoverlapping(
                self.ptr.as_ptr().add(offset),
                bytes.as_mut_ptr(),
                GUARD_LEN,
            );
        }
        bytes
    }

    /// True iff the guard bytes still hold [`GUARD_PATTERN`].
    pub fn check_guard(&self) -> bool {
        self.guard_bytes() == GUARD_PATTERN
    }

    /// Compares the logical region against `reference`, see [`check_match`].
    pub fn matches(&self, reference: &[T]) -> bool {
        check_match(reference, self.as_slice())
    }
}

impl<T: Element> Drop for GuardedBuffer<T> {
    fn drop(&mut self) {
        unsafe { dealloc(self.ptr.as_ptr(), self.layout) };
    }
}

impl<T: Element> fmt::Debug for GuardedBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuardedBuffer")
            .field("len", &self.len)
            .field("guard", &self.guard_bytes())
            .finish()
    }
}
