//! Job description and the small value types that flow through a download.
use crate::error::{DownloadError, Result};
use crate::utils;
use std::path::{Path, PathBuf};
use url::Url;

/// Resources at or below this many bytes are fetched with a single stream.
pub const SPLIT_DEFAULT: i64 = 10_000_000;

/// Lower bound on the default part count.
pub const MIN_DEFAULT_PARTS: usize = 4;

/// Default part count: the number of processing units, but never fewer than 4.
pub fn default_part_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .max(MIN_DEFAULT_PARTS)
}

/// A single download request.
///
/// Built with [`DownloadJob::new`] and the chained setters, then handed to
/// [`crate::DownloadEngine::execute`], which consumes it.
#[derive(Debug, Clone)]
pub struct DownloadJob {
    pub remote: Url,
    pub target: Option<PathBuf>,
    pub part_count: usize,
    /// `<= 0` forces a direct copy and skips the probe.
    pub min_split: i64,
    /// `0` computes the cap from the memory budget.
    pub max_workers: usize,
    pub memory_limit: Option<u64>,
}

impl DownloadJob {
    /// Validates the remote locator. No network traffic happens here.
    pub fn new(remote: &str) -> Result<Self> {
        let remote = remote.trim();
        if remote.is_empty() {
            return Err(DownloadError::InvalidInput("No remote specified".into()));
        }

        let remote = Url::parse(remote)
            .map_err(|e| DownloadError::InvalidInput(format!("{}: {}", remote, e)))?;

        if !matches!(remote.scheme(), "http" | "https") {
            return Err(DownloadError::InvalidInput(format!(
                "Unsupported scheme '{}'",
                remote.scheme()
            )));
        }

        Ok(Self {
            remote,
            target: None,
            part_count: default_part_count(),
            min_split: SPLIT_DEFAULT,
            max_workers: 0,
            memory_limit: None,
        })
    }

    /// Local file to write. Defaults to the final segment of the remote path.
    pub fn target(mut self, target: impl Into<PathBuf>) -> Self {
        let target = target.into();
        self.target = (!target.as_os_str().is_empty()).then_some(target);
        self
    }

    /// Number of parts the resource is split into in threaded mode.
    pub fn part_count(mut self, part_count: usize) -> Self {
        self.part_count = part_count;
        self
    }

    /// Minimum size before splitting kicks in. `<= 0` forces a direct copy.
    pub fn min_split(mut self, min_split: i64) -> Self {
        self.min_split = min_split;
        self
    }

    /// Explicit worker cap. `0` computes it from the memory budget.
    pub fn max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    /// Memory ceiling for in-flight ranges. `None` uses available host memory.
    pub fn memory_limit(mut self, memory_limit: Option<u64>) -> Self {
        self.memory_limit = memory_limit;
        self
    }

    /// Whether the capability probe should run at all.
    pub fn probe_enabled(&self) -> bool {
        self.min_split > 0
    }

    /// The target path, falling back to the remote resource's basename.
    pub fn resolve_target(&self) -> PathBuf {
        match &self.target {
            Some(t) => t.clone(),
            None => PathBuf::from(utils::derive_filename(&self.remote)),
        }
    }

    /// Like [`resolve_target`](Self::resolve_target) but places a derived
    /// filename under `dir`. An explicit target is returned untouched.
    pub fn resolve_target_in(&self, dir: &Path) -> PathBuf {
        match &self.target {
            Some(t) => t.clone(),
            None => dir.join(utils::derive_filename(&self.remote)),
        }
    }
}

/// Outcome of the metadata request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeResult {
    pub supports_ranges: bool,
    pub total_size: u64,
}

impl ProbeResult {
    pub fn unsupported() -> Self {
        Self {
            supports_ranges: false,
            total_size: 0,
        }
    }
}

/// One inclusive byte range of the remote resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartSpec {
    /// 1-based part number.
    pub index: usize,
    pub from: u64,
    pub to: u64,
}

impl PartSpec {
    pub fn range_header(&self) -> String {
        format!("bytes={}-{}", self.from, self.to)
    }

    /// Bytes a server owes for this part of a `total_size` byte resource.
    ///
    /// The final range names one byte past the end, so its end is clamped the
    /// way a server clamps it.
    pub fn expected_len(&self, total_size: u64) -> u64 {
        let end = self.to.min(total_size.saturating_sub(1));
        (end + 1).saturating_sub(self.from)
    }
}

/// How a job is fetched, picked once from the probe outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadMode {
    Threaded { total_size: u64 },
    Direct,
}

impl DownloadMode {
    pub fn select(probe: Option<ProbeResult>, min_split: i64) -> Self {
        match probe {
            Some(ProbeResult {
                supports_ranges: true,
                total_size,
            }) if min_split > 0 && total_size > min_split as u64 => {
                DownloadMode::Threaded { total_size }
            }
            _ => DownloadMode::Direct,
        }
    }
}

/// Summary of a completed job.
#[derive(Debug, Clone)]
pub struct DownloadReport {
    pub path: PathBuf,
    pub bytes_written: u64,
    pub mode: DownloadMode,
    /// Parts dispatched (1 for a direct copy).
    pub parts: usize,
    /// Concurrency actually allowed (1 for a direct copy).
    pub workers: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_remote_is_invalid_input() {
        assert!(matches!(
            DownloadJob::new(""),
            Err(DownloadError::InvalidInput(_))
        ));
        assert!(matches!(
            DownloadJob::new("   "),
            Err(DownloadError::InvalidInput(_))
        ));
    }

    #[test]
    fn malformed_remote_is_invalid_input() {
        assert!(matches!(
            DownloadJob::new("not a url"),
            Err(DownloadError::InvalidInput(_))
        ));
        assert!(matches!(
            DownloadJob::new("ftp://example.com/file"),
            Err(DownloadError::InvalidInput(_))
        ));
    }

    #[test]
    fn defaults() {
        let job = DownloadJob::new("https://example.com/files/archive.zip").unwrap();
        assert!(job.part_count >= MIN_DEFAULT_PARTS);
        assert_eq!(job.min_split, SPLIT_DEFAULT);
        assert_eq!(job.max_workers, 0);
        assert!(job.probe_enabled());
        assert_eq!(job.resolve_target(), PathBuf::from("archive.zip"));
    }

    #[test]
    fn explicit_target_wins() {
        let job = DownloadJob::new("https://example.com/files/archive.zip")
            .unwrap()
            .target("/tmp/out.bin");
        assert_eq!(job.resolve_target(), PathBuf::from("/tmp/out.bin"));
        assert_eq!(
            job.resolve_target_in(Path::new("downloads")),
            PathBuf::from("/tmp/out.bin")
        );

        let job = DownloadJob::new("https://example.com/files/archive.zip")
            .unwrap()
            .target("");
        assert_eq!(
            job.resolve_target_in(Path::new("downloads")),
            Path::new("downloads").join("archive.zip")
        );
    }

    #[test]
    fn derived_target_falls_back_for_bare_paths() {
        let job = DownloadJob::new("https://example.com/files/").unwrap();
        assert_eq!(job.resolve_target(), PathBuf::from(utils::FALLBACK_FILENAME));
        assert_eq!(
            job.resolve_target_in(Path::new("downloads")),
            Path::new("downloads").join(utils::FALLBACK_FILENAME)
        );

        let job = DownloadJob::new("https://example.com/get?file=archive.zip").unwrap();
        assert_eq!(job.resolve_target(), PathBuf::from("get"));
    }

    #[test]
    fn non_positive_split_disables_probe() {
        let job = DownloadJob::new("https://example.com/a").unwrap().min_split(0);
        assert!(!job.probe_enabled());
        let job = job.min_split(-5);
        assert!(!job.probe_enabled());
    }

    #[test]
    fn mode_selection() {
        let ranged = ProbeResult {
            supports_ranges: true,
            total_size: 500_000,
        };
        assert_eq!(DownloadMode::select(Some(ranged), SPLIT_DEFAULT), DownloadMode::Direct);
        assert_eq!(
            DownloadMode::select(Some(ranged), 1),
            DownloadMode::Threaded { total_size: 500_000 }
        );
        // Exactly at the threshold is not above it.
        assert_eq!(DownloadMode::select(Some(ranged), 500_000), DownloadMode::Direct);

        let no_ranges = ProbeResult {
            supports_ranges: false,
            total_size: 0,
        };
        assert_eq!(DownloadMode::select(Some(no_ranges), 1), DownloadMode::Direct);
        assert_eq!(DownloadMode::select(None, 0), DownloadMode::Direct);
    }

    #[test]
    fn range_header_is_inclusive_bytes_form() {
        let part = PartSpec {
            index: 2,
            from: 250_001,
            to: 500_000,
        };
        assert_eq!(part.range_header(), "bytes=250001-500000");
    }

    #[test]
    fn final_part_length_is_clamped_to_the_resource() {
        let inner = PartSpec {
            index: 1,
            from: 0,
            to: 33,
        };
        let last = PartSpec {
            index: 3,
            from: 67,
            to: 100,
        };
        assert_eq!(inner.expected_len(100), 34);
        assert_eq!(last.expected_len(100), 33);
    }
}
