//! Scoped-thread execution of partitioned work, one pinned worker per chunk.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use log::{debug, warn};

use crate::affinity::pin_current_thread;
use crate::errors::{HarnessError, HarnessResult};
use crate::partition::WorkChunk;

static AFFINITY_WARNED: AtomicBool = AtomicBool::new(false);

fn pin_or_log(worker: usize, cpu: usize) {
    if let Err(e) = pin_current_thread(cpu) {
        if !AFFINITY_WARNED.swap(true, Ordering::Relaxed) {
            warn!("Worker {} could not be pinned, continuing unpinned: {}", worker, e);
        } else {
            debug!("Worker {} could not be pinned: {}", worker, e);
        }
    }
}

/// Splits `output` along `chunks`, which must tile it exactly and in order.
fn split_output<'a, O>(
    chunks: &[WorkChunk],
    output: &'a mut [O],
) -> HarnessResult<Vec<&'a mut [O]>> {
    let total: usize = chunks.iter().map(|c| c.len).sum();
    if total != output.len() {
        return Err(HarnessError::invalid(
            "chunks",
            format!(
                "chunks cover {} elements but the output holds {}",
                total,
                output.len()
            ),
        ));
    }

    let mut slices = Vec::with_capacity(chunks.len());
    let mut rest = output;
    let mut expected_start = 0;
    for chunk in chunks {
        if chunk.start != expected_start {
            return Err(HarnessError::invalid(
                "chunks",
                format!(
                    "chunk starting at {} does not follow the previous chunk ending at {}",
                    chunk.start, expected_start
                ),
            ));
        }
        let (head, tail) = std::mem::take(&mut rest).split_at_mut(chunk.len);
        slices.push(head);
        rest = tail;
        expected_start = chunk.end();
    }
    Ok(slices)
}

/// Runs `work` once per chunk, each on its own disjoint slice of `output`.
///
/// The calling thread acts as worker 0: it is pinned to `chunks[0].cpu` and
/// executes the first chunk inline, while every other non-empty chunk gets a
/// freshly spawned scoped thread pinned to its CPU. All workers are joined
/// before returning, so no thread outlives the call.
///
/// # Errors
/// - `InvalidParameter` when `chunks` is empty or does not tile `output`.
/// - `WorkerCreationFailure` when a thread cannot be spawned. Workers that
///   already started are still joined before the error is returned.
/// - `WorkerPanicked` when a worker panics.
/// - Any error returned by `work` itself.
pub fn execute_chunks<O, F>(chunks: &[WorkChunk], output: &mut [O], work: F) -> HarnessResult<()>
where
    O: Send,
    F: Fn(&WorkChunk, &mut [O]) -> HarnessResult<()> + Sync,
{
    execute_chunks_with(chunks, output, work, worker_builder)
}

fn worker_builder(worker: usize) -> io::Result<thread::Builder> {
    Ok(thread::Builder::new().name(format!("kernbench-worker-{}", worker)))
}

/// [`execute_chunks`] with the thread builder of each spawned worker
/// supplied by `builder`.
fn execute_chunks_with<O, F, B>(
    chunks: &[WorkChunk],
    output: &mut [O],
    work: F,
    builder: B,
) -> HarnessResult<()>
where
    O: Send,
    F: Fn(&WorkChunk, &mut [O]) -> HarnessResult<()> + Sync,
    B: Fn(usize) -> io::Result<thread::Builder>,
{
    if chunks.is_empty() {
        return Err(HarnessError::invalid("chunks", "at least one chunk is required"));
    }

    let mut slices = split_output(chunks, output)?.into_iter();
    let first_slice = slices.next().unwrap_or_default();
    let first_chunk = &chunks[0];

    pin_or_log(0, first_chunk.cpu);

    if chunks.len() == 1 {
        return work(first_chunk, first_slice);
    }

    let work = &work;
    thread::scope(|scope| {
        let mut handles = Vec::with_capacity(chunks.len() - 1);
        let mut spawn_failure = None;

        for ((worker, chunk), slice) in chunks.iter().enumerate().skip(1).zip(slices) {
            if chunk.is_empty() {
                continue;
            }
            let spawned = builder(worker).and_then(|b| {
                b.spawn_scoped(scope, move || -> HarnessResult<()> {
                    pin_or_log(worker, chunk.cpu);
                    work(chunk, slice)
                })
            });
            match spawned {
                Ok(handle) => handles.push((worker, handle)),
                Err(source) => {
                    spawn_failure = Some(HarnessError::WorkerCreationFailure { worker, source });
                    break;
                }
            }
        }

        // Worker 0 only runs once every other worker is up.
        let mut first_error = match spawn_failure {
            Some(e) => Some(e),
            None => work(first_chunk, first_slice).err(),
        };

        for (worker, handle) in handles {
            let outcome = match handle.join() {
                Ok(result) => result,
                Err(_) => Err(HarnessError::WorkerPanicked { worker }),
            };
            if let Err(e) = outcome {
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    })
}
