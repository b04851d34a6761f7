//! Byte storage used by the conversion engine.
//!
//! The engine never touches the filesystem directly. It reads inputs,
//! opens the output sink and deletes partial artifacts through the
//! [`Storage`] trait, which has two implementations:
//!
//! - [`FsStorage`]: tokio-backed filesystem storage rooted at an output
//!   directory.
//! - [`MemoryStorage`]: in-process storage with fault injection, used to
//!   exercise failure paths in tests.

pub mod fs;
pub mod memory;

pub use fs::FsStorage;
pub use memory::MemoryStorage;

use async_trait::async_trait;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWrite;

/// A freshly created output destination.
pub struct WriteSink {
    /// Where the bytes end up.
    pub path: PathBuf,
    /// Raw byte writer; buffering is the caller's concern.
    pub writer: Box<dyn AsyncWrite + Send + Unpin>,
}

impl fmt::Debug for WriteSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteSink")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Storage capability consumed by the converter.
#[async_trait]
pub trait Storage: Send + Sync + fmt::Debug {
    /// Size in bytes of the file at `path`.
    ///
    /// Fails if the path does not exist, is not a regular file, or cannot
    /// be opened and read.
    async fn size(&self, path: &Path) -> io::Result<u64>;

    /// Full contents of the file at `path`.
    async fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Create a new artifact called `name` in the output location.
    ///
    /// Uses create-new semantics: an existing artifact with the same name
    /// is an `AlreadyExists` error, never overwritten.
    async fn open_write_sink(&self, name: &str) -> io::Result<WriteSink>;

    /// Remove the file at `path`.
    async fn delete(&self, path: &Path) -> io::Result<()>;
}
