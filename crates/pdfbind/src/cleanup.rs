//! Removal of partially written artifacts.
//!
//! Cleanup is best-effort. It never returns an error: a failed delete is
//! logged as a warning and the caller goes on to report the error that made
//! cleanup necessary in the first place.

use std::io;
use std::path::Path;
use std::sync::Arc;

use crate::storage::Storage;

/// What happened to a partial artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupOutcome {
    /// The artifact was deleted.
    Removed,
    /// There was nothing to delete.
    AlreadyGone,
    /// Deletion failed; the artifact may still exist.
    Failed,
}

/// Deletes partial artifacts after a failed job.
#[derive(Debug, Clone)]
pub struct CleanupManager {
    storage: Arc<dyn Storage>,
}

impl CleanupManager {
    /// Create a cleanup manager deleting through `storage`.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Delete the artifact at `path`.
    #[tracing::instrument(skip(self), fields(path = %path.display()))]
    pub async fn discard(&self, path: &Path) -> CleanupOutcome {
        match self.storage.delete(path).await {
            Ok(()) => {
                tracing::debug!("partial output removed");
                CleanupOutcome::Removed
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => CleanupOutcome::AlreadyGone,
            Err(e) => {
                tracing::warn!(error = %e, "failed to remove partial output");
                CleanupOutcome::Failed
            }
        }
    }
}
