//! File layout and runtime settings
//!
//! Every file the tool reads or writes lives in one data directory; the
//! client secrets path can be overridden separately.

use crate::transfer::config::{DEFAULT_INTER_ITEM_DELAY_SECS, DEFAULT_MAX_RETRIES};
use crate::AccountRole;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Extracted subscription snapshot
pub const SNAPSHOT_FILE: &str = "subscriptions_backup.json";

/// Progress ledger of the current import
pub const PROGRESS_FILE: &str = "transfer_progress.json";

/// OAuth client secrets downloaded from the Google Cloud console
pub const CREDENTIALS_FILE: &str = "credentials.json";

/// Application log file
pub const LOG_FILE: &str = "youtube_transfer.log";

/// Runtime configuration shared by every command
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Directory holding snapshot, progress, tokens and log
    pub data_dir: PathBuf,
    /// OAuth client secrets file
    pub credentials_path: PathBuf,
    /// Courtesy delay between items
    pub inter_item_delay: Duration,
    /// Retries after the first attempt of each item
    pub max_retries: u32,
    /// Prometheus scrape endpoint, if enabled
    pub metrics_addr: Option<SocketAddr>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new(".")
    }
}

impl AppConfig {
    /// Configuration rooted at `data_dir` with default settings
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            credentials_path: data_dir.join(CREDENTIALS_FILE),
            data_dir,
            inter_item_delay: Duration::from_secs_f64(DEFAULT_INTER_ITEM_DELAY_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
            metrics_addr: None,
        }
    }

    /// Override the client secrets location
    pub fn with_credentials_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.credentials_path = path.into();
        self
    }

    /// Set the courtesy delay between items
    pub fn with_inter_item_delay(mut self, delay: Duration) -> Self {
        self.inter_item_delay = delay;
        self
    }

    /// Set the retry bound
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Enable the Prometheus endpoint
    pub fn with_metrics_addr(mut self, addr: Option<SocketAddr>) -> Self {
        self.metrics_addr = addr;
        self
    }

    /// Data directory
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Snapshot file path
    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join(SNAPSHOT_FILE)
    }

    /// Progress ledger path
    pub fn progress_path(&self) -> PathBuf {
        self.data_dir.join(PROGRESS_FILE)
    }

    /// Stored OAuth token for `role`
    pub fn token_path(&self, role: AccountRole) -> PathBuf {
        self.data_dir.join(format!("token_{role}.json"))
    }

    /// Log file path
    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join(LOG_FILE)
    }
}
