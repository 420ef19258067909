//! Snapshot document persistence
//!
//! The extracted subscription list is stored as one pretty-printed JSON
//! document carrying its export time and item count. The count is
//! informational: readers recompute it from the sequence.

use crate::resume::write_atomic;
use crate::SubscriptionRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Maximum accepted snapshot size (64 MB)
pub const MAX_SNAPSHOT_FILE_SIZE: u64 = 64 * 1024 * 1024;

/// On-disk snapshot layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotDocument {
    /// When the snapshot was written (ISO-8601)
    pub export_date: String,
    /// Item count at write time
    pub total_subscriptions: usize,
    /// Records in source order
    pub subscriptions: Vec<SubscriptionRecord>,
}

impl SnapshotDocument {
    /// Wrap `items` with the current export date and their count
    pub fn new(items: Vec<SubscriptionRecord>) -> Self {
        Self::at(items, Utc::now())
    }

    /// Wrap `items` with an explicit export date
    pub fn at(items: Vec<SubscriptionRecord>, export_date: DateTime<Utc>) -> Self {
        Self {
            export_date: export_date.to_rfc3339(),
            total_subscriptions: items.len(),
            subscriptions: items,
        }
    }
}

/// Errors related to snapshot persistence
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// Snapshot file does not exist
    #[error("snapshot not found: {0}")]
    NotFound(PathBuf),

    /// Snapshot file too large
    #[error("snapshot too large: {size} bytes (max: {max} bytes)")]
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
}

/// Snapshot file at a fixed path
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    /// Create a store backed by `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the snapshot
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a snapshot exists on disk
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Write `items` as a new snapshot
    pub fn save(&self, items: &[SubscriptionRecord]) -> Result<(), SnapshotError> {
        let document = SnapshotDocument::new(items.to_vec());
        let json = serde_json::to_string_pretty(&document)
            .map_err(|e| SnapshotError::SerializationError(e.to_string()))?;

        write_atomic(&self.path, json.as_bytes())
            .map_err(|e| SnapshotError::IoError(format!("Failed to write snapshot: {e}")))?;

        info!(
            path = %self.path.display(),
            total = document.total_subscriptions,
            "Saved {} subscriptions",
            document.total_subscriptions
        );
        Ok(())
    }

    /// Read the snapshot document, returning any failure
    pub fn try_load_document(&self) -> Result<SnapshotDocument, SnapshotError> {
        let metadata = match std::fs::metadata(&self.path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SnapshotError::NotFound(self.path.clone()))
            }
            Err(e) => return Err(SnapshotError::IoError(e.to_string())),
        };

        if metadata.len() > MAX_SNAPSHOT_FILE_SIZE {
            return Err(SnapshotError::FileTooLarge {
                size: metadata.len(),
                max: MAX_SNAPSHOT_FILE_SIZE,
            });
        }

        let contents = std::fs::read_to_string(&self.path)
            .map_err(|e| SnapshotError::IoError(e.to_string()))?;

        serde_json::from_str(&contents)
            .map_err(|e| SnapshotError::DeserializationError(e.to_string()))
    }

    /// Read the records, dropping invalid ones
    pub fn try_load(&self) -> Result<Vec<SubscriptionRecord>, SnapshotError> {
        let document = self.try_load_document()?;

        if document.total_subscriptions != document.subscriptions.len() {
            warn!(
                declared = document.total_subscriptions,
                actual = document.subscriptions.len(),
                "Snapshot count does not match its contents; using actual length"
            );
        }

        let mut items = Vec::with_capacity(document.subscriptions.len());
        for (index, record) in document.subscriptions.into_iter().enumerate() {
            match record.validate() {
                Ok(()) => items.push(record),
                Err(e) => warn!(index, error = %e, "Skipping invalid snapshot record"),
            }
        }

        info!(
            path = %self.path.display(),
            total = items.len(),
            "Loaded {} subscriptions",
            items.len()
        );
        Ok(items)
    }

    /// Read the records; any failure yields an empty list
    pub fn load(&self) -> Vec<SubscriptionRecord> {
        match self.try_load() {
            Ok(items) => items,
            Err(SnapshotError::NotFound(path)) => {
                warn!(path = %path.display(), "No saved subscriptions found");
                Vec::new()
            }
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to load saved subscriptions"
                );
                Vec::new()
            }
        }
    }
}
