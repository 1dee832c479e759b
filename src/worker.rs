use crate::error::{DownloadError, Result};
use crate::job::PartSpec;
use crate::observer::{ByteCounter, ProgressObserver};
use reqwest::StatusCode;
use reqwest::header::RANGE;
use std::io::SeekFrom;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs::OpenOptions;
use tokio::io::{AsyncSeekExt, AsyncWriteExt, BufWriter};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

/// Everything a part worker shares with its siblings.
///
/// Cloning is cheap: the client, counter, observer and token are all handles
/// onto shared state.
#[derive(Clone)]
pub struct WorkerContext {
    pub client: reqwest::Client,
    pub url: Url,
    pub output: PathBuf,
    /// Size of the whole resource, used to clamp the final part.
    pub total_size: u64,
    pub counter: ByteCounter,
    pub observer: Arc<dyn ProgressObserver>,
    pub cancel: CancellationToken,
}

/// Downloads a single part and writes it at its offset in the target file.
///
/// The target must already be allocated to its final length. The response
/// body is streamed straight into the file, so at most one body piece per
/// worker is held in memory. Returns the number of bytes written.
///
/// # Errors
///
/// * [`DownloadError::RangeMismatch`] if the server does not answer with
///   206 Partial Content, or its body is longer or shorter than the part.
///   Nothing is written in the first case.
/// * [`DownloadError::Cancelled`] if the token fires before or during the
///   transfer.
pub async fn download_part(part: PartSpec, ctx: WorkerContext) -> Result<u64> {
    if ctx.cancel.is_cancelled() {
        return Err(DownloadError::Cancelled);
    }

    let request = ctx
        .client
        .get(ctx.url.clone())
        .header(RANGE, part.range_header())
        .send();

    let mut response = tokio::select! {
        _ = ctx.cancel.cancelled() => return Err(DownloadError::Cancelled),
        response = request => response?,
    };

    if response.status() != StatusCode::PARTIAL_CONTENT {
        return Err(DownloadError::RangeMismatch {
            part: part.index,
            status: response.status(),
            content_length: response.content_length(),
        });
    }
    debug!(
        "Part {} retrieved {:?} bytes",
        part.index,
        response.content_length()
    );

    let file = OpenOptions::new().write(true).open(&ctx.output).await?;
    let mut writer = BufWriter::new(file);
    writer.get_mut().seek(SeekFrom::Start(part.from)).await?;

    let expected = part.expected_len(ctx.total_size);
    let mut written = 0u64;

    loop {
        let piece = tokio::select! {
            _ = ctx.cancel.cancelled() => return Err(DownloadError::Cancelled),
            piece = response.chunk() => piece?,
        };
        let Some(bytes) = piece else { break };

        let len = bytes.len() as u64;
        if written + len > expected {
            return Err(DownloadError::RangeMismatch {
                part: part.index,
                status: StatusCode::PARTIAL_CONTENT,
                content_length: Some(written + len),
            });
        }

        writer.write_all(&bytes).await?;
        written += len;
        ctx.counter.add(len);
        ctx.observer.inc(len);
    }

    // Ensure all bytes reach the file before the part counts as done
    writer.flush().await?;

    if written != expected {
        return Err(DownloadError::RangeMismatch {
            part: part.index,
            status: StatusCode::PARTIAL_CONTENT,
            content_length: Some(written),
        });
    }

    debug!("Finished part {} ({} bytes)", part.index, written);
    Ok(written)
}
