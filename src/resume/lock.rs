//! Advisory run lock next to the progress record
//!
//! Held for the whole import so two processes never drive the same ledger.

use super::ledger::LedgerError;
use fd_lock::RwLock;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Exclusive lock on `<progress>.lock`, released on drop
#[derive(Debug)]
pub struct RunLock {
    _file: File,
    path: PathBuf,
}

impl RunLock {
    /// Lock file guarding the ledger at `progress_path`
    pub fn lock_path(progress_path: &Path) -> PathBuf {
        progress_path.with_extension("lock")
    }

    /// Try to acquire the lock without blocking
    ///
    /// Returns an error immediately if another process holds it.
    pub fn try_acquire(progress_path: &Path) -> Result<Self, LedgerError> {
        if let Some(parent) = progress_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| LedgerError::IoError(e.to_string()))?;
            }
        }

        let path = Self::lock_path(progress_path);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| LedgerError::LockError(format!("Failed to open lock file: {e}")))?;

        let mut lock = RwLock::new(file);
        let guard = lock.try_write().map_err(|e| {
            LedgerError::LockError(format!(
                "another transfer appears to be running ({}): {e}",
                path.display()
            ))
        })?;
        // The OS lock lives as long as the descriptor; keep it past the guard
        std::mem::forget(guard);
        let file = lock.into_inner();

        debug!(path = %path.display(), "Run lock acquired");
        Ok(Self { _file: file, path })
    }

    /// Path of the lock file
    pub fn path(&self) -> &Path {
        &self.path
    }
}
