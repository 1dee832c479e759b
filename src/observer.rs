//! Progress reporting.
//!
//! Workers report through a [`ProgressObserver`] so the library stays free of
//! any particular UI. The [`ByteCounter`] keeps the running total that the
//! engine checks and reports back once the job finishes.
use indicatif::ProgressBar;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Receives progress events from the engine and its workers.
pub trait ProgressObserver: Send + Sync {
    /// Called once the total size is known (`None` when it is not).
    fn start(&self, total: Option<u64>);
    /// Called for every piece of the body written to disk.
    fn inc(&self, delta: u64);
    /// Called once the engine has picked how to fetch the job.
    fn message(&self, msg: String);
    fn finish(&self);
}

/// Shared running total of bytes written, updated by every worker.
///
/// Once every part has finished it must equal the resource size.
#[derive(Debug, Clone, Default)]
pub struct ByteCounter(Arc<AtomicU64>);

impl ByteCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `n` and returns the new total.
    pub fn add(&self, n: u64) -> u64 {
        self.0.fetch_add(n, Ordering::Relaxed) + n
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Drives an `indicatif` progress bar.
pub struct ConsoleObserver {
    pub pb: ProgressBar,
}

impl ProgressObserver for ConsoleObserver {
    fn start(&self, total: Option<u64>) {
        if let Some(total) = total {
            self.pb.set_length(total);
        }
    }

    fn inc(&self, delta: u64) {
        self.pb.inc(delta);
    }

    fn message(&self, msg: String) {
        self.pb.set_message(msg);
    }

    fn finish(&self) {
        self.pb.finish_with_message("Done!");
    }
}

/// Discards every event.
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {
    fn start(&self, _total: Option<u64>) {}
    fn inc(&self, _delta: u64) {}
    fn message(&self, _msg: String) {}
    fn finish(&self) {}
}
