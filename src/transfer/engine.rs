//! Resumable batch transfer engine
//!
//! Walks an ordered list of records one at a time. Before item `i` is
//! attempted the ledger is rewritten to name `i - 1` as the last resolved
//! item, so a run killed mid-attempt resumes by re-attempting `i`; the
//! subscribe mutation is idempotent, which makes the repeat harmless. A full
//! pass clears the ledger even when some items failed.

use super::config::PROGRESS_SUMMARY_INTERVAL;
use super::observer::TransferObserver;
use super::retry::RetryPolicy;
use super::stats::{ItemResult, TransferStatistics};
use crate::client::SubscriptionApi;
use crate::resume::ProgressLedger;
use crate::shutdown::{sleep_or_shutdown, SharedShutdown};
use crate::SubscriptionRecord;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Drives a transfer run over a list of subscription records
pub struct TransferEngine {
    api: Arc<dyn SubscriptionApi>,
    ledger: ProgressLedger,
    policy: RetryPolicy,
    observer: Arc<dyn TransferObserver>,
    shutdown: Option<SharedShutdown>,
}

impl TransferEngine {
    /// Create an engine
    pub fn new(
        api: Arc<dyn SubscriptionApi>,
        ledger: ProgressLedger,
        policy: RetryPolicy,
        observer: Arc<dyn TransferObserver>,
    ) -> Self {
        Self {
            api,
            ledger,
            policy,
            observer,
            shutdown: None,
        }
    }

    /// Set shutdown coordinator for graceful cancellation between items
    pub fn with_shutdown(mut self, shutdown: SharedShutdown) -> Self {
        self.policy = self.policy.with_shutdown(shutdown.clone());
        self.shutdown = Some(shutdown);
        self
    }

    /// Progress ledger used by this engine
    pub fn ledger(&self) -> &ProgressLedger {
        &self.ledger
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown
            .as_ref()
            .is_some_and(|shutdown| shutdown.is_shutdown_requested())
    }

    /// Decide where the run starts
    ///
    /// A fresh run discards any leftover record so it cannot alter this run.
    fn start_index(&self, total: usize, resume_requested: bool) -> usize {
        if !resume_requested {
            if self.ledger.exists() {
                info!(
                    path = %self.ledger.path().display(),
                    "Discarding progress from a previous run"
                );
            }
            self.ledger.clear();
            return 0;
        }

        let Some(record) = self.ledger.load() else {
            info!("No saved progress found, starting from the beginning");
            return 0;
        };

        if record.total_subscriptions != total {
            warn!(
                saved_total = record.total_subscriptions,
                current_total = total,
                "Saved progress was recorded for a list of a different length"
            );
        }

        let next = record.next_index();
        if next > total {
            warn!(
                next_index = next,
                total, "Saved progress is past the end of the list; nothing left to resume"
            );
            return total;
        }

        info!(
            last_channel_id = %record.last_channel_id,
            last_processed_index = record.last_processed_index,
            "Found saved progress"
        );
        next
    }

    /// Record every item before `next` as resolved
    fn save_resolved(&self, items: &[SubscriptionRecord], next: usize) {
        let last_channel_id = next
            .checked_sub(1)
            .and_then(|last| items.get(last))
            .map_or("", |record| record.channel_id.as_str());
        self.ledger
            .save(next as i64 - 1, last_channel_id, items.len());
    }

    /// Run the transfer over `items`
    ///
    /// `delay` is the courtesy pause after every item. Returns statistics for
    /// this run; `interrupted` is set when a shutdown request stopped it early,
    /// in which case the ledger is left on disk.
    pub async fn run(
        &self,
        items: &[SubscriptionRecord],
        resume_requested: bool,
        delay: Duration,
    ) -> TransferStatistics {
        let total = items.len();
        let mut stats = TransferStatistics::new(total);

        let start = self.start_index(total, resume_requested);
        stats.skipped = start;
        self.observer.run_started(total, start, resume_requested);

        for (index, record) in items.iter().enumerate().skip(start) {
            if self.is_shutdown_requested() {
                stats.interrupted = true;
                self.save_resolved(items, index);
                break;
            }

            self.save_resolved(items, index);
            self.observer.item_started(index, total, record);

            let result = if self.api.is_already_subscribed(&record.channel_id).await {
                ItemResult::AlreadySubscribed
            } else if self.policy.attempt(self.api.as_ref(), &record.channel_id).await {
                ItemResult::Subscribed
            } else if self.is_shutdown_requested() {
                // Unresolved; the ledger still points here for the next resume
                debug!(index, channel_id = %record.channel_id, "Item interrupted");
                stats.interrupted = true;
                break;
            } else {
                ItemResult::Failed
            };

            stats.record(result);
            self.observer.item_finished(index, record, result);

            let processed = index + 1 - start;
            if processed % PROGRESS_SUMMARY_INTERVAL == 0 {
                self.observer.batch_progress(processed, total - index - 1);
            }

            if !delay.is_zero() {
                sleep_or_shutdown(self.shutdown.as_deref(), delay).await;
            }
        }

        if !stats.interrupted {
            self.ledger.clear();
        }

        self.observer.run_finished(&stats);
        stats
    }
}
