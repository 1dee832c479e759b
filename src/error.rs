//! Error taxonomy for the download engine.
//!
//! Every variant is terminal: the engine never retries a part or a job, so a
//! caller receiving any of these must treat the target file as incomplete.
use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DownloadError>;

#[derive(Debug, Error)]
pub enum DownloadError {
    /// The remote locator was empty or could not be parsed.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The metadata probe (or the direct GET) did not return a success status.
    #[error("Remote unavailable. Status Code: {status}")]
    RemoteUnavailable { status: StatusCode },

    /// A ranged request came back with something other than 206 Partial Content.
    #[error(
        "Did not retrieve partial content for part {part}; got status {status} and length {}",
        .content_length.map_or_else(|| "unknown".to_string(), |l| l.to_string())
    )]
    RangeMismatch {
        part: usize,
        status: StatusCode,
        content_length: Option<u64>,
    },

    /// The memory ceiling cannot hold even a single range.
    #[error(
        "Insufficient memory: ceiling of {ceiling} bytes cannot hold a {range_size} byte range; \
         raise the memory limit or increase the part count"
    )]
    InsufficientMemory { ceiling: u64, range_size: u64 },

    /// The requested part count cannot split the resource.
    #[error("Cannot split {total_size} bytes into {parts} parts")]
    InvalidPartition { parts: usize, total_size: u64 },

    /// Allocation, seek or write failure on the target file.
    #[error("Filesystem error: {0}")]
    Filesystem(#[source] std::io::Error),

    /// Memory exhaustion observed while fetching a part.
    #[error("Out of resources: {0}")]
    OutOfResources(String),

    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// The transfer ended with a different byte count than the resource size.
    #[error("Incomplete download: expected {expected} bytes, received {received}")]
    Incomplete { expected: u64, received: u64 },

    #[error("Download cancelled")]
    Cancelled,

    #[error("Worker task failed: {0}")]
    WorkerPanicked(String),
}

impl From<std::io::Error> for DownloadError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::OutOfMemory {
            DownloadError::OutOfResources(err.to_string())
        } else {
            DownloadError::Filesystem(err)
        }
    }
}

impl From<tokio::task::JoinError> for DownloadError {
    fn from(err: tokio::task::JoinError) -> Self {
        DownloadError::WorkerPanicked(err.to_string())
    }
}

impl DownloadError {
    /// True for errors that are a side effect of another failure's cancellation.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, DownloadError::Cancelled)
    }
}
