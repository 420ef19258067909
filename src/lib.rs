//! # YouTube Subscription Transfer Library
//!
//! Moves the channel subscriptions of one YouTube account to another through
//! the YouTube Data API v3, with a transfer engine that survives interruption.
//!
//! ## Features
//!
//! - **Extraction**: Paginated export of the source account's subscriptions
//! - **Snapshots**: Self-describing JSON backup of the extracted list
//! - **Resumable Import**: A progress ledger written before every item so an
//!   interrupted run picks up where it stopped
//! - **Retry Policy**: Outcome-aware retries (exponential for rate limits,
//!   linear for transient failures, none for permanent ones)
//! - **Observability**: Structured `tracing` events and optional Prometheus metrics
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use youtube_subscription_transfer::client::YouTubeClient;
//! use youtube_subscription_transfer::resume::ProgressLedger;
//! use youtube_subscription_transfer::snapshot::SnapshotStore;
//! use youtube_subscription_transfer::transfer::{RetryPolicy, TracingObserver, TransferEngine};
//!
//! # async fn example(client: YouTubeClient) {
//! let items = SnapshotStore::new("subscriptions_backup.json").load();
//! let observer = Arc::new(TracingObserver);
//! let engine = TransferEngine::new(
//!     Arc::new(client),
//!     ProgressLedger::new("transfer_progress.json"),
//!     RetryPolicy::new(3, observer.clone()),
//!     observer,
//! );
//! let stats = engine.run(&items, false, Duration::from_millis(500)).await;
//! println!("{} successful, {} failed", stats.successful, stats.failed);
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`client`] - Remote mutation client and outcome classification
//! - [`transfer`] - Retry policy, batch transfer engine and run statistics
//! - [`resume`] - Progress ledger and run lock
//! - [`snapshot`] - Snapshot document persistence
//! - [`extract`] - Paginated extraction of the source subscriptions
//! - [`auth`] - OAuth token loading and refresh per account role
//! - [`config`] - File layout and runtime settings
//! - [`cli`] - Command line surface and interactive menu

#![warn(missing_docs)]
#![warn(clippy::all)]

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// OAuth token loading and refresh
pub mod auth;

/// CLI command implementations
pub mod cli;

/// Remote API client
pub mod client;

/// File layout and runtime settings
pub mod config;

/// Extraction of the source account's subscriptions
pub mod extract;

/// Prometheus metrics helpers
pub mod metrics;

/// Progress ledger for resumable runs
pub mod resume;

/// Graceful shutdown coordination
pub mod shutdown;

/// Snapshot document persistence
pub mod snapshot;

/// Batch transfer engine
pub mod transfer;

pub use client::{MutationOutcome, SubscriptionApi};
pub use transfer::{TransferEngine, TransferStatistics};

/// One channel subscription to replicate on the destination account
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubscriptionRecord {
    /// Stable channel identifier (e.g., "UC_x5XG1OV2P6uZZ5FSM9Ttw")
    pub channel_id: String,
    /// Channel title, for display only
    pub channel_title: String,
    /// Channel description
    #[serde(default)]
    pub channel_description: String,
    /// When the source account subscribed (ISO-8601, informational)
    #[serde(default)]
    pub published_at: String,
    /// Identifier of the source account's subscription, kept for audit
    #[serde(default)]
    pub subscription_id: String,
}

impl SubscriptionRecord {
    /// Create a record with only the fields the transfer needs
    pub fn new(channel_id: impl Into<String>, channel_title: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            channel_title: channel_title.into(),
            channel_description: String::new(),
            published_at: String::new(),
            subscription_id: String::new(),
        }
    }

    /// Validate record integrity
    pub fn validate(&self) -> Result<(), String> {
        if self.channel_id.trim().is_empty() {
            return Err(format!(
                "Channel ID cannot be empty (title: {:?})",
                self.channel_title
            ));
        }

        Ok(())
    }

    /// Title used in log lines, falling back to the channel ID
    pub fn display_name(&self) -> &str {
        if self.channel_title.is_empty() {
            &self.channel_id
        } else {
            &self.channel_title
        }
    }
}

/// Account role an authorized session acts for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountRole {
    /// Account whose subscriptions are extracted
    Source,
    /// Account that receives the subscriptions
    Destination,
}

impl fmt::Display for AccountRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AccountRole::Source => "source",
            AccountRole::Destination => "destination",
        };
        write!(f, "{s}")
    }
}

impl FromStr for AccountRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "source" => Ok(AccountRole::Source),
            "destination" => Ok(AccountRole::Destination),
            _ => Err(format!("Invalid account role: {s}")),
        }
    }
}
