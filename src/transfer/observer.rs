//! Observability sink for transfer runs
//!
//! The engine and retry policy report every event through a
//! [`TransferObserver`] handed to them at construction. Implementations must
//! not block and must not fail; the default methods ignore the event.

use super::stats::{ItemResult, TransferStatistics};
use crate::client::MutationOutcome;
use crate::metrics;
use crate::SubscriptionRecord;
use std::time::Duration;
use tracing::{error, info, warn};

/// Receiver of transfer events
#[allow(unused_variables)]
pub trait TransferObserver: Send + Sync {
    /// A run begins at `start_index` of `total` items
    fn run_started(&self, total: usize, start_index: usize, resumed: bool) {}

    /// Item `index` is about to be processed
    fn item_started(&self, index: usize, total: usize, record: &SubscriptionRecord) {}

    /// One subscribe call returned `outcome`
    fn attempt_outcome(
        &self,
        channel_id: &str,
        attempt: u32,
        max_attempts: u32,
        outcome: &MutationOutcome,
    ) {
    }

    /// A retry will follow after `delay`
    fn retry_scheduled(
        &self,
        channel_id: &str,
        attempt: u32,
        max_attempts: u32,
        delay: Duration,
        outcome: &MutationOutcome,
    ) {
    }

    /// Item `index` reached its final result
    fn item_finished(&self, index: usize, record: &SubscriptionRecord, result: ItemResult) {}

    /// Periodic summary of the run so far
    fn batch_progress(&self, processed: usize, remaining: usize) {}

    /// The run ended (completed or interrupted)
    fn run_finished(&self, stats: &TransferStatistics) {}
}

/// Observer that emits `tracing` events and metrics
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl TransferObserver for TracingObserver {
    fn run_started(&self, total: usize, start_index: usize, resumed: bool) {
        if resumed && start_index > 0 {
            info!(
                total,
                start_index,
                remaining = total.saturating_sub(start_index),
                "Resuming transfer from item {}",
                start_index + 1
            );
        } else {
            info!(total, "Starting transfer of {} subscriptions", total);
        }
    }

    fn item_started(&self, index: usize, total: usize, record: &SubscriptionRecord) {
        info!(
            index,
            channel_id = %record.channel_id,
            "[{}/{}] Processing: {}",
            index + 1,
            total,
            record.display_name()
        );
    }

    fn attempt_outcome(
        &self,
        channel_id: &str,
        attempt: u32,
        max_attempts: u32,
        outcome: &MutationOutcome,
    ) {
        metrics::record_attempt(outcome.label());

        match outcome {
            MutationOutcome::Success => {
                info!(channel_id = %channel_id, attempt, "Subscribed");
            }
            MutationOutcome::AlreadyExists => {
                info!(channel_id = %channel_id, attempt, "Already subscribed");
            }
            MutationOutcome::NotFound => {
                warn!(channel_id = %channel_id, attempt, "Channel not found, skipping");
            }
            MutationOutcome::QuotaExceeded => {
                error!(
                    channel_id = %channel_id,
                    attempt,
                    "API quota exceeded; remaining items will fail until the quota resets"
                );
            }
            MutationOutcome::RateLimited
            | MutationOutcome::TransientError(_)
            | MutationOutcome::UnknownError(_) => {
                warn!(
                    channel_id = %channel_id,
                    attempt,
                    max_attempts,
                    outcome = outcome.label(),
                    "Attempt failed: {}",
                    outcome
                );
            }
        }
    }

    fn retry_scheduled(
        &self,
        channel_id: &str,
        attempt: u32,
        max_attempts: u32,
        delay: Duration,
        outcome: &MutationOutcome,
    ) {
        metrics::record_retry(outcome.label(), delay);
        info!(
            channel_id = %channel_id,
            attempt,
            max_attempts,
            delay_secs = delay.as_secs_f64(),
            reason = outcome.label(),
            "Retrying in {:.1}s (attempt {}/{})",
            delay.as_secs_f64(),
            attempt + 1,
            max_attempts
        );
    }

    fn item_finished(&self, index: usize, record: &SubscriptionRecord, result: ItemResult) {
        metrics::record_item_result(result.label());
        if result == ItemResult::Failed {
            error!(
                index,
                channel_id = %record.channel_id,
                "Failed to subscribe to {}",
                record.display_name()
            );
        }
    }

    fn batch_progress(&self, processed: usize, remaining: usize) {
        info!(processed, remaining, "Progress: {} processed, {} remaining", processed, remaining);
    }

    fn run_finished(&self, stats: &TransferStatistics) {
        metrics::record_run_finished(stats.interrupted);
        if stats.interrupted {
            warn!(
                total = stats.total,
                successful = stats.successful,
                failed = stats.failed,
                already_subscribed = stats.already_subscribed,
                skipped = stats.skipped,
                remaining = stats.remaining(),
                "Transfer interrupted; progress saved for resume"
            );
        } else {
            info!(
                total = stats.total,
                successful = stats.successful,
                failed = stats.failed,
                already_subscribed = stats.already_subscribed,
                skipped = stats.skipped,
                success_rate = %format!("{:.1}%", stats.success_rate()),
                "Transfer completed"
            );
        }
    }
}
