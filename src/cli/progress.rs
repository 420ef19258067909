//! Terminal progress bar for imports

use crate::client::MutationOutcome;
use crate::transfer::{ItemResult, TracingObserver, TransferObserver, TransferStatistics};
use crate::SubscriptionRecord;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}";

/// Observer that drives an `indicatif` bar and forwards to [`TracingObserver`]
pub struct ProgressBarObserver {
    inner: TracingObserver,
    bar: ProgressBar,
}

impl ProgressBarObserver {
    /// Bar sized for `total` items
    pub fn new(total: usize) -> Self {
        let bar = ProgressBar::new(total as u64);
        let style = ProgressStyle::default_bar()
            .template(BAR_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(200));

        Self {
            inner: TracingObserver,
            bar,
        }
    }
}

impl TransferObserver for ProgressBarObserver {
    fn run_started(&self, total: usize, start_index: usize, resumed: bool) {
        self.bar.set_length(total as u64);
        self.bar.set_position(start_index as u64);
        self.inner.run_started(total, start_index, resumed);
    }

    fn item_started(&self, index: usize, total: usize, record: &SubscriptionRecord) {
        self.bar.set_message(record.display_name().to_string());
        self.inner.item_started(index, total, record);
    }

    fn attempt_outcome(
        &self,
        channel_id: &str,
        attempt: u32,
        max_attempts: u32,
        outcome: &MutationOutcome,
    ) {
        self.inner
            .attempt_outcome(channel_id, attempt, max_attempts, outcome);
    }

    fn retry_scheduled(
        &self,
        channel_id: &str,
        attempt: u32,
        max_attempts: u32,
        delay: Duration,
        outcome: &MutationOutcome,
    ) {
        self.bar
            .set_message(format!("retrying in {:.0}s", delay.as_secs_f64()));
        self.inner
            .retry_scheduled(channel_id, attempt, max_attempts, delay, outcome);
    }

    fn item_finished(&self, index: usize, record: &SubscriptionRecord, result: ItemResult) {
        self.bar.inc(1);
        self.inner.item_finished(index, record, result);
    }

    fn batch_progress(&self, processed: usize, remaining: usize) {
        self.inner.batch_progress(processed, remaining);
    }

    fn run_finished(&self, stats: &TransferStatistics) {
        if stats.interrupted {
            self.bar.abandon_with_message("interrupted");
        } else {
            self.bar.finish_with_message("done");
        }
        self.inner.run_finished(stats);
    }
}
