//! Progress ledger persistence
//!
//! A single JSON record marking the last resolved position of a run. The
//! engine rewrites it before every attempt, so after a crash it is at or
//! behind the true progress, never ahead.

use super::atomic::write_atomic;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Maximum accepted ledger file size (1 MB); anything larger is not ours
pub const MAX_LEDGER_FILE_SIZE: u64 = 1024 * 1024;

/// Marker of the last resolved position in a transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    /// Index of the last resolved item, -1 when none
    pub last_processed_index: i64,
    /// Channel at that index (informational, empty when none)
    pub last_channel_id: String,
    /// Length of the list when the record was written
    pub total_subscriptions: usize,
    /// When the record was written (ISO-8601)
    pub timestamp: String,
}

impl ProgressRecord {
    /// Build a record stamped with the current time
    pub fn new(last_processed_index: i64, channel_id: impl Into<String>, total: usize) -> Self {
        Self {
            last_processed_index,
            last_channel_id: channel_id.into(),
            total_subscriptions: total,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Index a resumed run starts from
    pub fn next_index(&self) -> usize {
        self.last_processed_index
            .checked_add(1)
            .and_then(|next| usize::try_from(next).ok())
            .unwrap_or(0)
    }

    /// Whether the recorded position is one a run could have written
    pub fn is_valid(&self) -> bool {
        self.last_processed_index >= -1
            && self
                .last_processed_index
                .checked_add(1)
                .is_some_and(|next| usize::try_from(next).is_ok())
    }

    /// Items left after the recorded position
    pub fn remaining(&self) -> usize {
        self.total_subscriptions.saturating_sub(self.next_index())
    }
}

/// Errors related to the progress ledger
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Ledger file too large
    #[error("progress file too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge {
        /// Actual file size
        size: u64,
        /// Maximum allowed size
        max: u64,
    },

    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// Deserialization error
    #[error("deserialization error: {0}")]
    DeserializationError(String),

    /// Lock error
    #[error("lock error: {0}")]
    LockError(String),
}

/// Singleton progress record stored at a fixed path
#[derive(Debug, Clone)]
pub struct ProgressLedger {
    path: PathBuf,
}

impl ProgressLedger {
    /// Create a ledger backed by `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the progress record
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a progress record is present on disk
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Overwrite the record, returning any failure
    pub fn try_save(
        &self,
        last_processed_index: i64,
        channel_id: &str,
        total: usize,
    ) -> Result<(), LedgerError> {
        let record = ProgressRecord::new(last_processed_index, channel_id, total);
        let json = serde_json::to_string_pretty(&record)
            .map_err(|e| LedgerError::SerializationError(e.to_string()))?;

        write_atomic(&self.path, json.as_bytes())
            .map_err(|e| LedgerError::IoError(format!("Failed to write progress: {e}")))?;

        debug!(
            path = %self.path.display(),
            last_processed_index,
            channel_id = %channel_id,
            total,
            "Progress saved"
        );
        Ok(())
    }

    /// Overwrite the record; failures only degrade resumability and are logged
    pub fn save(&self, last_processed_index: i64, channel_id: &str, total: usize) {
        if let Err(e) = self.try_save(last_processed_index, channel_id, total) {
            warn!(
                path = %self.path.display(),
                last_processed_index,
                error = %e,
                "Failed to save progress; continuing without it"
            );
        }
    }

    /// Read the record; `Ok(None)` when none exists
    pub fn try_load(&self) -> Result<Option<ProgressRecord>, LedgerError> {
        let metadata = match std::fs::metadata(&self.path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(LedgerError::IoError(e.to_string())),
        };

        if metadata.len() > MAX_LEDGER_FILE_SIZE {
            return Err(LedgerError::FileTooLarge {
                size: metadata.len(),
                max: MAX_LEDGER_FILE_SIZE,
            });
        }

        let contents =
            std::fs::read_to_string(&self.path).map_err(|e| LedgerError::IoError(e.to_string()))?;

        let record: ProgressRecord = serde_json::from_str(&contents)
            .map_err(|e| LedgerError::DeserializationError(e.to_string()))?;

        if !record.is_valid() {
            return Err(LedgerError::DeserializationError(format!(
                "last_processed_index {} out of range",
                record.last_processed_index
            )));
        }

        debug!(
            last_processed_index = record.last_processed_index,
            total = record.total_subscriptions,
            "Progress loaded"
        );
        Ok(Some(record))
    }

    /// Read the record; a corrupt record counts as no progress
    pub fn load(&self) -> Option<ProgressRecord> {
        match self.try_load() {
            Ok(record) => record,
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Ignoring unreadable progress file"
                );
                None
            }
        }
    }

    /// Remove the record; `Ok(false)` when there was nothing to remove
    pub fn try_clear(&self) -> Result<bool, LedgerError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(LedgerError::IoError(e.to_string())),
        }
    }

    /// Remove the record, logging failures
    pub fn clear(&self) {
        match self.try_clear() {
            Ok(true) => info!(path = %self.path.display(), "Progress cleared"),
            Ok(false) => debug!(path = %self.path.display(), "No progress to clear"),
            Err(e) => warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to clear progress"
            ),
        }
    }
}
