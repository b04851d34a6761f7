//! In-memory storage with fault injection.
//!
//! Files live in a shared map keyed by path. Clones share the same map, so
//! a test can keep one handle for inspection while the converter owns
//! another.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};
use tokio::io::AsyncWrite;

use super::{Storage, WriteSink};

#[derive(Debug, Default)]
struct Faults {
    deny_metadata: HashSet<PathBuf>,
    deny_read: HashSet<PathBuf>,
    fail_create: bool,
    fail_writes_after: Option<u64>,
    close_sinks: bool,
    fail_deletes: bool,
}

#[derive(Debug, Default)]
struct State {
    files: HashMap<PathBuf, Vec<u8>>,
    faults: Faults,
}

/// Storage that keeps every file in memory.
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    output_dir: PathBuf,
    state: Arc<Mutex<State>>,
}

impl MemoryStorage {
    /// Create empty storage whose artifacts are placed under `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        lock_state(&self.state)
    }

    /// Store `bytes` at `path`, replacing any previous content.
    pub fn insert(&self, path: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) {
        self.lock().files.insert(path.into(), bytes.into());
    }

    /// Current contents of `path`.
    pub fn contents(&self, path: &Path) -> Option<Vec<u8>> {
        self.lock().files.get(path).cloned()
    }

    /// Every file currently stored under the output directory.
    pub fn artifacts(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self
            .lock()
            .files
            .keys()
            .filter(|p| p.parent() == Some(self.output_dir.as_path()))
            .cloned()
            .collect();
        paths.sort();
        paths
    }

    /// Make `size` (and `read`) of `path` fail with `PermissionDenied`.
    pub fn deny_metadata(&self, path: impl Into<PathBuf>) {
        self.lock().faults.deny_metadata.insert(path.into());
    }

    /// Make `read` of `path` fail while `size` still succeeds, as if the
    /// input became unreadable after validation.
    pub fn deny_read(&self, path: impl Into<PathBuf>) {
        self.lock().faults.deny_read.insert(path.into());
    }

    /// Make every `open_write_sink` fail.
    pub fn fail_create(&self) {
        self.lock().faults.fail_create = true;
    }

    /// Make each sink fail once it has accepted `bytes` bytes.
    pub fn fail_writes_after(&self, bytes: u64) {
        self.lock().faults.fail_writes_after = Some(bytes);
    }

    /// Make every sink behave as if the destination was closed.
    pub fn close_sinks(&self) {
        self.lock().faults.close_sinks = true;
    }

    /// Make every `delete` fail.
    pub fn fail_deletes(&self) {
        self.lock().faults.fail_deletes = true;
    }
}

fn lock_state(state: &Mutex<State>) -> MutexGuard<'_, State> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn permission_denied(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::PermissionDenied,
        format!("access denied: {}", path.display()),
    )
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("no such file: {}", path.display()),
    )
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn size(&self, path: &Path) -> io::Result<u64> {
        let state = self.lock();
        if state.faults.deny_metadata.contains(path) {
            return Err(permission_denied(path));
        }
        state
            .files
            .get(path)
            .map(|bytes| bytes.len() as u64)
            .ok_or_else(|| not_found(path))
    }

    async fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        let state = self.lock();
        if state.faults.deny_metadata.contains(path) || state.faults.deny_read.contains(path) {
            return Err(permission_denied(path));
        }
        state.files.get(path).cloned().ok_or_else(|| not_found(path))
    }

    async fn open_write_sink(&self, name: &str) -> io::Result<WriteSink> {
        let path = self.output_dir.join(name);
        let mut state = self.lock();
        if state.faults.fail_create {
            return Err(permission_denied(&path));
        }
        if state.files.contains_key(&path) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("already exists: {}", path.display()),
            ));
        }
        state.files.insert(path.clone(), Vec::new());
        drop(state);

        let writer = MemorySink {
            path: path.clone(),
            state: Arc::clone(&self.state),
            written: 0,
        };
        Ok(WriteSink {
            path,
            writer: Box::new(writer),
        })
    }

    async fn delete(&self, path: &Path) -> io::Result<()> {
        let mut state = self.lock();
        if state.faults.fail_deletes {
            return Err(permission_denied(path));
        }
        state
            .files
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| not_found(path))
    }
}

/// Writer appending into one entry of the shared map.
struct MemorySink {
    path: PathBuf,
    state: Arc<Mutex<State>>,
    written: u64,
}

impl AsyncWrite for MemorySink {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        let mut state = lock_state(&this.state);

        if state.faults.close_sinks {
            return Poll::Ready(Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "destination closed",
            )));
        }

        let accepted = match state.faults.fail_writes_after {
            Some(limit) => {
                let remaining = limit.saturating_sub(this.written);
                if remaining == 0 {
                    return Poll::Ready(Err(io::Error::other("injected write failure")));
                }
                buf.len().min(usize::try_from(remaining).unwrap_or(usize::MAX))
            }
            None => buf.len(),
        };

        let Some(entry) = state.files.get_mut(&this.path) else {
            return Poll::Ready(Err(not_found(&this.path)));
        };
        entry.extend_from_slice(&buf[..accepted]);
        this.written += accepted as u64;
        Poll::Ready(Ok(accepted))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let state = lock_state(&self.state);
        if state.faults.close_sinks {
            return Poll::Ready(Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "destination closed",
            )));
        }
        Poll::Ready(Ok(()))
    }
}
