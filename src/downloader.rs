// src/downloader.rs
use crate::error::{DownloadError, Result};
use crate::job::{DownloadJob, DownloadMode, DownloadReport, PartSpec};
use crate::observer::{ByteCounter, NoopObserver, ProgressObserver};
use crate::worker::{WorkerContext, download_part};
use crate::{allocator, budget, probe, utils};
use futures_util::StreamExt;
use indicatif::HumanBytes;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Runs download jobs: probe, pick a mode, then either fan out ranged
/// workers or stream the resource in one piece.
pub struct DownloadEngine {
    client: Client,
    observer: Arc<dyn ProgressObserver>,
    cancel: CancellationToken,
}

impl DownloadEngine {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            observer: Arc::new(NoopObserver),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Cancelling `token` stops the running job with [`DownloadError::Cancelled`].
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Executes `job` to completion.
    ///
    /// On error the target path holds undefined, partial content.
    pub async fn execute(&self, job: DownloadJob) -> Result<DownloadReport> {
        let started = Instant::now();
        let target = job.resolve_target();

        let probed = if job.probe_enabled() {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(DownloadError::Cancelled),
                probed = probe::probe(&job.remote, &self.client) => Some(probed?),
            }
        } else {
            debug!("Minimum split is {}; skipping probe", job.min_split);
            None
        };

        let mode = DownloadMode::select(probed, job.min_split);
        let report = match mode {
            DownloadMode::Threaded { total_size } => {
                info!(
                    "Downloading {} ({}) in {} parts to {}",
                    job.remote,
                    HumanBytes(total_size),
                    job.part_count,
                    target.display()
                );
                self.observer
                    .message(format!("{} ({} parts)", target.display(), job.part_count));
                self.threaded(&job, target, total_size).await?
            }
            DownloadMode::Direct => {
                info!("Downloading directly to {}", target.display());
                self.observer
                    .message(format!("{} (single stream)", target.display()));
                self.direct_copy(&job, target).await?
            }
        };

        self.observer.finish();
        info!(
            "Completed writing {} ({} bytes) in {:.2?}",
            HumanBytes(report.bytes_written),
            report.bytes_written,
            started.elapsed()
        );

        Ok(report)
    }

    async fn threaded(
        &self,
        job: &DownloadJob,
        target: PathBuf,
        total_size: u64,
    ) -> Result<DownloadReport> {
        let parts = utils::calculate_parts(total_size, job.part_count)?;

        let ceiling = job.memory_limit.unwrap_or_else(budget::available_memory);
        let workers = budget::max_workers(total_size, job.part_count, ceiling, job.max_workers)?;
        info!(
            "Using up to {} concurrent workers for {} parts",
            workers,
            parts.len()
        );

        if self.cancel.is_cancelled() {
            return Err(DownloadError::Cancelled);
        }
        let file = allocator::allocate(&target, total_size).await?;
        self.observer.start(Some(total_size));

        let counter = ByteCounter::new();
        let cancel = self.cancel.child_token();
        let ctx = WorkerContext {
            client: self.client.clone(),
            url: job.remote.clone(),
            output: target.clone(),
            total_size,
            counter: counter.clone(),
            observer: self.observer.clone(),
            cancel: cancel.clone(),
        };

        self.run_parts(parts.clone(), ctx, workers, &cancel).await?;

        if counter.get() != total_size {
            return Err(DownloadError::Incomplete {
                expected: total_size,
                received: counter.get(),
            });
        }

        file.sync_all().await?;
        drop(file);

        Ok(DownloadReport {
            path: target,
            bytes_written: counter.get(),
            mode: DownloadMode::Threaded { total_size },
            parts: parts.len(),
            workers,
        })
    }

    /// Dispatches one task per part; at most `workers` run at once.
    ///
    /// The first fatal error cancels `cancel`, so queued parts never start and
    /// in-flight ones stop at their next await. All tasks are drained before
    /// returning, so no worker holds the target open afterwards.
    async fn run_parts(
        &self,
        parts: Vec<PartSpec>,
        ctx: WorkerContext,
        workers: usize,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let semaphore = Arc::new(Semaphore::new(workers));
        let mut tasks = JoinSet::new();

        for part in parts {
            debug!(
                "Adding range for index {} from {} to {}",
                part.index, part.from, part.to
            );
            let ctx = ctx.clone();
            let semaphore = semaphore.clone();

            tasks.spawn(async move {
                let _permit = tokio::select! {
                    _ = ctx.cancel.cancelled() => return Err(DownloadError::Cancelled),
                    permit = semaphore.acquire_owned() => {
                        permit.map_err(|_| DownloadError::Cancelled)?
                    }
                };
                download_part(part, ctx).await
            });
        }

        let mut first_error: Option<DownloadError> = None;

        while let Some(joined) = tasks.join_next().await {
            let Err(e) = joined.map_err(DownloadError::from).and_then(|r| r) else {
                continue;
            };

            if !cancel.is_cancelled() {
                error!("Part failed, stopping remaining work: {}", e);
                cancel.cancel();
            }

            // A cancellation is only the answer if nothing real went wrong.
            let replace = match &first_error {
                None => true,
                Some(prev) => prev.is_cancellation() && !e.is_cancellation(),
            };
            if replace {
                first_error = Some(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn direct_copy(&self, job: &DownloadJob, target: PathBuf) -> Result<DownloadReport> {
        let bytes_written = stream_to_file(
            &self.client,
            job,
            &target,
            self.observer.as_ref(),
            &self.cancel,
        )
        .await?;

        Ok(DownloadReport {
            path: target,
            bytes_written,
            mode: DownloadMode::Direct,
            parts: 1,
            workers: 1,
        })
    }
}

/// Sequentially copies the whole resource into a freshly created `target`.
async fn stream_to_file(
    client: &Client,
    job: &DownloadJob,
    target: &Path,
    observer: &dyn ProgressObserver,
    cancel: &CancellationToken,
) -> Result<u64> {
    let response = tokio::select! {
        _ = cancel.cancelled() => return Err(DownloadError::Cancelled),
        response = client.get(job.remote.clone()).send() => response?,
    };

    if !response.status().is_success() {
        return Err(DownloadError::RemoteUnavailable {
            status: response.status(),
        });
    }
    let declared = response.content_length();
    observer.start(declared);

    let mut writer = BufWriter::new(File::create(target).await?);
    let mut stream = response.bytes_stream();
    let mut written = 0u64;

    loop {
        let piece = tokio::select! {
            _ = cancel.cancelled() => return Err(DownloadError::Cancelled),
            piece = stream.next() => piece,
        };
        let Some(bytes) = piece else { break };
        let bytes = bytes?;

        writer.write_all(&bytes).await?;
        written += bytes.len() as u64;
        observer.inc(bytes.len() as u64);
    }

    writer.flush().await?;
    writer.into_inner().sync_all().await?;

    if let Some(expected) = declared
        && written != expected
    {
        return Err(DownloadError::Incomplete {
            expected,
            received: written,
        });
    }

    Ok(written)
}
