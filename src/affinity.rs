//! CPU affinity helpers.
//!
//! Pinning is best effort: failures are returned to the caller, which logs
//! them and keeps running on whatever CPU the scheduler picks.

use crate::errors::{AffinityError, AffinityResult};

/// Binds the calling thread to `cpu`.
#[cfg(target_os = "linux")]
pub fn pin_current_thread(cpu: usize) -> AffinityResult<()> {
    set_current_affinity(&[cpu])
}

/// Binds the calling thread (and every thread it spawns afterwards) to the
/// given CPUs. Used once at process start-up.
#[cfg(target_os = "linux")]
pub fn restrict_process(cpus: &[usize]) -> AffinityResult<()> {
    set_current_affinity(cpus)
}

#[cfg(target_os = "linux")]
fn set_current_affinity(cpus: &[usize]) -> AffinityResult<()> {
    let max = libc::CPU_SETSIZE as usize;
    let mut set: libc::cpu_set_t = unsafe { std::mem::zeroed() };
    for &cpu in cpus {
        if cpu >= max {
            return Err(AffinityError::CpuOutOfRange { cpu, max });
        }
        unsafe { libc::CPU_SET(cpu, &mut set) };
    }

    // pid 0 targets the calling thread.
    let rc = unsafe { libc::sched_setaffinity(0, size_of::<libc::cpu_set_t>(), &set) };
    if rc != 0 {
        return Err(AffinityError::SetAffinity {
            cpu: cpus.first().copied().unwrap_or_default(),
            source: std::io::Error::last_os_error(),
        });
    }
    Ok(())
}

#[cfg(not(target_os = "linux"))]
pub fn pin_current_thread(cpu: usize) -> AffinityResult<()> {
    Err(AffinityError::Unsupported { cpu })
}

#[cfg(not(target_os = "linux"))]
pub fn restrict_process(cpus: &[usize]) -> AffinityResult<()> {
    Err(AffinityError::Unsupported {
        cpu: cpus.first().copied().unwrap_or_default(),
    })
}

/// CPUs used by a run with `threads` workers starting at `base_cpu`,
/// matching the per-chunk assignment of [`partition`](crate::partition::partition).
pub fn process_cpu_set(threads: usize, base_cpu: usize) -> Vec<usize> {
    if threads == 0 {
        return Vec::new();
    }
    (0..threads).map(|i| (base_cpu % threads + i) % threads).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_cpu_set_matches_chunk_assignment() {
        assert_eq!(process_cpu_set(4, 1), vec![1, 2, 3, 0]);
        assert_eq!(process_cpu_set(1, 5), vec![0]);
        assert!(process_cpu_set(0, 0).is_empty());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_out_of_range_cpu_is_rejected() {
        let result = pin_current_thread(usize::MAX);
        assert!(matches!(result, Err(AffinityError::CpuOutOfRange { .. })));
    }
}
