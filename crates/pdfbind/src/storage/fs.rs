//! Filesystem storage backed by tokio.

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncReadExt;

use super::{Storage, WriteSink};

/// Filesystem storage writing artifacts into one output directory.
#[derive(Debug, Clone)]
pub struct FsStorage {
    output_dir: PathBuf,
}

impl FsStorage {
    /// Create storage writing artifacts into `output_dir`.
    ///
    /// The directory is not touched until [`ensure_output_dir`] or the
    /// first write.
    ///
    /// [`ensure_output_dir`]: FsStorage::ensure_output_dir
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Directory artifacts are written into.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Create the output directory (and parents) if it is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created, or if the path
    /// exists and is not a directory.
    pub async fn ensure_output_dir(&self) -> io::Result<()> {
        fs::create_dir_all(&self.output_dir).await?;
        tracing::debug!(dir = %self.output_dir.display(), "output directory ready");
        Ok(())
    }
}

#[async_trait]
impl Storage for FsStorage {
    async fn size(&self, path: &Path) -> io::Result<u64> {
        let mut file = fs::File::open(path).await?;
        let metadata = file.metadata().await?;
        if !metadata.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "not a regular file",
            ));
        }
        // Opening is not enough for some special files; the first read fails.
        let mut first_byte = [0u8; 1];
        let _ = file.read(&mut first_byte).await?;
        Ok(metadata.len())
    }

    async fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path).await
    }

    async fn open_write_sink(&self, name: &str) -> io::Result<WriteSink> {
        let path = self.output_dir.join(name);
        let file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;
        Ok(WriteSink {
            path,
            writer: Box::new(file),
        })
    }

    async fn delete(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path).await
    }

}
