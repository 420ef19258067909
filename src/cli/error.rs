//! CLI error types and conversions

use crate::auth::AuthError;
use crate::client::ClientError;
use crate::resume::LedgerError;
use crate::snapshot::SnapshotError;
use std::path::PathBuf;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Authentication error
    #[error("authentication error: {0}")]
    AuthError(#[from] AuthError),

    /// Remote API error
    #[error("API error: {0}")]
    ClientError(#[from] ClientError),

    /// Snapshot error
    #[error("snapshot error: {0}")]
    SnapshotError(#[from] SnapshotError),

    /// Progress ledger error
    #[error("progress error: {0}")]
    LedgerError(#[from] LedgerError),

    /// Nothing to import
    #[error("no subscription data found at {0}; extract subscriptions first")]
    NoSnapshot(PathBuf),

    /// Extraction produced nothing
    #[error("no subscriptions found or extraction failed")]
    NoSubscriptions,

    /// Ctrl+C stopped extraction before the last page
    #[error("extraction interrupted; saved subscription data left unchanged")]
    Interrupted,

    /// Terminal prompt failed
    #[error("prompt error: {0}")]
    PromptError(String),
}

impl From<dialoguer::Error> for CliError {
    fn from(e: dialoguer::Error) -> Self {
        Self::PromptError(e.to_string())
    }
}
