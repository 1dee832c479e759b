//! Worker budget: how many ranges may be in flight at once.
//!
//! Resident memory of a threaded download is `O(max_workers * range_size)`,
//! so the number of concurrent workers is bounded by the memory ceiling
//! divided by the size of one range.
use crate::error::{DownloadError, Result};
use sysinfo::System;
use tracing::debug;

/// Memory the host currently reports as available, in bytes.
pub fn available_memory() -> u64 {
    let mut sys = System::new();
    sys.refresh_memory();
    sys.available_memory()
}

/// Computes the worker cap for a threaded download.
///
/// A non-zero `requested` cap is honored as-is. Otherwise the cap is
/// `floor(memory_ceiling / range_size)`, clamped to `part_count`.
///
/// # Errors
///
/// Returns [`DownloadError::InsufficientMemory`] when the ceiling cannot hold
/// even one range.
pub fn max_workers(
    total_size: u64,
    part_count: usize,
    memory_ceiling: u64,
    requested: usize,
) -> Result<usize> {
    if requested > 0 {
        debug!("Using requested worker cap of {}", requested);
        return Ok(requested);
    }

    let range_size = total_size / part_count.max(1) as u64;
    if range_size == 0 {
        return Err(DownloadError::InvalidPartition {
            parts: part_count,
            total_size,
        });
    }

    let computed = memory_ceiling / range_size;
    if computed == 0 {
        return Err(DownloadError::InsufficientMemory {
            ceiling: memory_ceiling,
            range_size,
        });
    }

    let workers = usize::try_from(computed)
        .unwrap_or(usize::MAX)
        .min(part_count);

    debug!(
        "Memory ceiling {} allows {} ranges of {} bytes; using {} workers",
        memory_ceiling, computed, range_size, workers
    );

    Ok(workers)
}
