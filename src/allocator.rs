//! Target pre-allocation.
use crate::error::Result;
use std::path::Path;
use tokio::fs::{File, OpenOptions};
use tracing::debug;

/// Opens (creating if needed) `path` for writing and fixes its length to
/// `total_size` before any part is written.
///
/// Every worker's seek-and-write then lands inside the file, and workers
/// never race to grow it. The returned handle is held by the engine and
/// closed once all parts are done.
///
/// # Errors
///
/// Returns [`crate::DownloadError::Filesystem`] on permission problems or
/// when the disk cannot hold `total_size` bytes.
pub async fn allocate(path: &Path, total_size: u64) -> Result<File> {
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .await?;

    file.set_len(total_size).await?;
    debug!("Pre-allocated {} to {} bytes", path.display(), total_size);

    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn allocates_exact_length() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("target.bin");

        let file = allocate(&path, 1_000_000).await?;
        drop(file);

        assert_eq!(tokio::fs::metadata(&path).await?.len(), 1_000_000);
        Ok(())
    }

    #[tokio::test]
    async fn allocation_is_idempotent() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("target.bin");

        drop(allocate(&path, 4096).await?);
        drop(allocate(&path, 4096).await?);

        assert_eq!(tokio::fs::metadata(&path).await?.len(), 4096);
        Ok(())
    }

    #[tokio::test]
    async fn shrinks_a_larger_existing_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("target.bin");
        tokio::fs::write(&path, vec![7u8; 10_000]).await?;

        drop(allocate(&path, 100).await?);

        assert_eq!(tokio::fs::metadata(&path).await?.len(), 100);
        Ok(())
    }

    #[tokio::test]
    async fn missing_directory_is_a_filesystem_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("no/such/dir/target.bin");

        let err = allocate(&path, 10).await.unwrap_err();
        assert!(matches!(err, crate::DownloadError::Filesystem(_)));
    }
}
