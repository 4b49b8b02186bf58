//! Splitting a linear index range into per-worker chunks.

use std::ops::Range;

use serde::Serialize;

use crate::errors::{HarnessError, HarnessResult};

/// One worker's contiguous slice of the index range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WorkChunk {
    /// First element index of the chunk.
    pub start: usize,
    /// Number of elements in the chunk.
    pub len: usize,
    /// Logical CPU the worker should be pinned to.
    pub cpu: usize,
}

impl WorkChunk {
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end()
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Divides `[0, total)` into `threads` contiguous chunks.
///
/// Every chunk gets `total / threads` elements. The `total % threads`
/// leftover elements go to chunk 0, which the calling thread executes, so
/// nothing is dropped. Chunk `i` is assigned CPU `(base_cpu + i) % threads`.
///
/// # Errors
/// `InvalidParameter` when `threads` is zero.
pub fn partition(total: usize, threads: usize, base_cpu: usize) -> HarnessResult<Vec<WorkChunk>> {
    if threads == 0 {
        return Err(HarnessError::invalid(
            "threads",
            "thread count must be at least 1",
        ));
    }

    let per_worker = total / threads;
    let remainder = total % threads;
    let base = base_cpu % threads;

    let mut chunks = Vec::with_capacity(threads);
    let mut start = 0;
    for index in 0..threads {
        let len = if index == 0 {
            per_worker + remainder
        } else {
            per_worker
        };
        chunks.push(WorkChunk {
            start,
            len,
            cpu: (base + index) % threads,
        });
        start += len;
    }

    Ok(chunks)
}
