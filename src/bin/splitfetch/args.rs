//! Command-line argument definitions for the `splitfetch` binary.
use clap::Parser;

/// A concurrent, range-splitting file downloader.
///
/// Splits a remote file into byte ranges, fetches them in parallel and
/// writes each one directly to its place in the output file. Falls back to a
/// single stream when the server does not support ranges or the file is small.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Args {
    /// The URL of the file to download.
    #[arg(short, long)]
    pub url: String,

    /// The name of the output file. Defaults to the last segment of the URL.
    #[arg(short, long)]
    pub output: Option<String>,

    /// The directory to save the file in when no output name is given.
    #[arg(short = 'D', long)]
    pub dir: Option<String>,

    /// Number of parts to split the file into. Defaults to the CPU count (at least 4).
    #[arg(short, long)]
    pub parts: Option<usize>,

    /// Minimum size in bytes before splitting. Zero or less forces a single stream.
    #[arg(short = 's', long, allow_negative_numbers = true)]
    pub min_split: Option<i64>,

    /// Maximum concurrent workers. Zero or less derives it from the memory limit.
    #[arg(short = 'w', long, allow_negative_numbers = true)]
    pub max_workers: Option<i64>,

    /// Memory ceiling in bytes for in-flight ranges. Defaults to available memory.
    #[arg(short, long)]
    pub memory_limit: Option<u64>,

    /// Force a single-stream download.
    #[arg(long)]
    pub single: bool,

    /// Enable debug logging.
    #[arg(short, long)]
    pub debug: bool,
}
