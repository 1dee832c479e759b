//! Utility helpers used across the crate.
//!
//! Byte range arithmetic for splitting a resource into parts, and the local
//! name for targets that were not named explicitly.
use crate::error::{DownloadError, Result};
use crate::job::PartSpec;
use percent_encoding::percent_decode_str;
use sanitize_filename::sanitize;
use url::Url;

/// Computes the inclusive `(from, to)` boundaries of part `index` (1-based).
///
/// The first part starts at 0 and every following part starts one past the
/// previous part's end. The last part absorbs the integer division remainder
/// and requests up to `total_size` itself; servers clamp the inclusive end to
/// the last byte.
pub fn range_for(index: usize, part_count: usize, range_size: u64, total_size: u64) -> (u64, u64) {
    let from = if index == 1 {
        0
    } else {
        (index as u64 - 1) * range_size + 1
    };

    let to = if index == part_count {
        total_size
    } else {
        index as u64 * range_size
    };

    (from, to)
}

/// Divides `total_size` into `part_count` ranges for concurrent download.
///
/// # Errors
///
/// Returns [`DownloadError::InvalidPartition`] when `part_count` is zero or
/// larger than `total_size`, since some part would end before it starts.
pub fn calculate_parts(total_size: u64, part_count: usize) -> Result<Vec<PartSpec>> {
    if part_count == 0 || part_count as u64 > total_size {
        return Err(DownloadError::InvalidPartition {
            parts: part_count,
            total_size,
        });
    }

    let range_size = total_size / part_count as u64;

    Ok((1..=part_count)
        .map(|index| {
            let (from, to) = range_for(index, part_count, range_size, total_size);
            PartSpec { index, from, to }
        })
        .collect())
}

/// Name used when the remote path has no usable last segment.
pub const FALLBACK_FILENAME: &str = "output.bin";

/// Local filename for `remote`: its last path segment, percent-decoded and
/// stripped of characters the filesystem rejects. The query and fragment
/// never contribute.
pub fn derive_filename(remote: &Url) -> String {
    let segment = remote
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or_default();
    let name = sanitize(percent_decode_str(segment).decode_utf8_lossy());

    if name.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        name
    }
}
