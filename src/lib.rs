//! # splitfetch
//!
//! `splitfetch` speeds up the retrieval of a single large file by splitting
//! it into byte ranges, fetching the ranges concurrently over HTTP and
//! writing each one straight to its offset in a pre-sized local file.
//!
//! - A HEAD probe decides whether the server honors ranges.
//! - The number of concurrent workers is bounded by a memory ceiling.
//! - Servers without range support, and small files, fall back to a single
//!   streamed copy.
//!
//! ## Example Usage
//!
//! ```no_run
//! use splitfetch::{DownloadEngine, DownloadJob};
//!
//! # async fn run() -> Result<(), splitfetch::DownloadError> {
//! let job = DownloadJob::new("https://example.com/big.iso")?
//!     .target("big.iso")
//!     .part_count(8);
//! let report = DownloadEngine::new(reqwest::Client::new()).execute(job).await?;
//! println!("wrote {} bytes", report.bytes_written);
//! # Ok(())
//! # }
//! ```

pub mod allocator;
pub mod budget;
pub mod config;
pub mod downloader;
pub mod error;
pub mod job;
pub mod observer;
pub mod probe;
pub mod utils;
pub mod worker;

pub use downloader::DownloadEngine;
pub use error::DownloadError;
pub use job::{DownloadJob, DownloadMode, DownloadReport, PartSpec, ProbeResult};
pub use observer::{ByteCounter, ConsoleObserver, ProgressObserver};
pub use worker::download_part;
