//! Per-run transfer statistics

use serde::Serialize;
use std::fmt;

/// Final result of one item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemResult {
    /// Subscription created (or confirmed by the mutation itself)
    Subscribed,
    /// Pre-check found the destination already subscribed
    AlreadySubscribed,
    /// Permanent failure or retries exhausted
    Failed,
}

impl ItemResult {
    /// Stable label used for log fields and metric labels
    pub fn label(&self) -> &'static str {
        match self {
            Self::Subscribed => "successful",
            Self::AlreadySubscribed => "already_subscribed",
            Self::Failed => "failed",
        }
    }
}

/// Counters for one transfer run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransferStatistics {
    /// Items in the input list
    pub total: usize,
    /// Items subscribed by this run
    pub successful: usize,
    /// Items that could not be subscribed
    pub failed: usize,
    /// Items the destination already followed
    pub already_subscribed: usize,
    /// Items before the resume offset
    pub skipped: usize,
    /// Run stopped on a shutdown request before visiting every item
    pub interrupted: bool,
}

impl TransferStatistics {
    /// Empty statistics for a list of `total` items
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    /// Count one finished item
    pub fn record(&mut self, result: ItemResult) {
        match result {
            ItemResult::Subscribed => self.successful += 1,
            ItemResult::AlreadySubscribed => self.already_subscribed += 1,
            ItemResult::Failed => self.failed += 1,
        }
    }

    /// Items resolved by this run
    pub fn processed(&self) -> usize {
        self.successful + self.failed + self.already_subscribed
    }

    /// Items neither skipped nor resolved
    pub fn remaining(&self) -> usize {
        self.total
            .saturating_sub(self.skipped)
            .saturating_sub(self.processed())
    }

    /// Share of processed items now in the subscribed state
    pub fn success_rate(&self) -> f64 {
        let processed = self.processed();
        if processed == 0 {
            return 0.0;
        }
        (self.successful + self.already_subscribed) as f64 / processed as f64 * 100.0
    }
}

impl fmt::Display for TransferStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "total={} successful={} already_subscribed={} failed={} skipped={}",
            self.total, self.successful, self.already_subscribed, self.failed, self.skipped
        )?;
        if self.interrupted {
            write!(f, " (interrupted)")?;
        }
        Ok(())
    }
}
