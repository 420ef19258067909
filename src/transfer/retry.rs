//! Outcome-aware retry policy around a single subscribe call
//!
//! Rate limits back off exponentially, transient failures linearly, and
//! permanent outcomes end the item on the first attempt. The policy never
//! fails: every path resolves to a boolean.

use super::config::{rate_limit_backoff, transient_backoff, DEFAULT_MAX_RETRIES};
use super::observer::TransferObserver;
use crate::client::{Disposition, SubscriptionApi};
use crate::shutdown::{sleep_or_shutdown, SharedShutdown};
use std::sync::Arc;
use tracing::debug;

/// Bounded retry loop for the subscribe mutation
#[derive(Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    observer: Arc<dyn TransferObserver>,
    shutdown: Option<SharedShutdown>,
}

impl RetryPolicy {
    /// Create a policy allowing `max_retries` retries after the first attempt
    pub fn new(max_retries: u32, observer: Arc<dyn TransferObserver>) -> Self {
        Self {
            max_retries,
            observer,
            shutdown: None,
        }
    }

    /// Policy with [`DEFAULT_MAX_RETRIES`]
    pub fn with_default_retries(observer: Arc<dyn TransferObserver>) -> Self {
        Self::new(DEFAULT_MAX_RETRIES, observer)
    }

    /// Set shutdown coordinator; a shutdown request cuts backoff waits short
    pub fn with_shutdown(mut self, shutdown: SharedShutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Retries allowed after the first attempt
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Total attempts per item
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Drive `ensure_subscribed` until the channel is subscribed or the item is lost
    ///
    /// Returns `true` when the destination now follows `channel_id`, `false`
    /// on a permanent outcome, exhausted retries, or a shutdown during backoff.
    pub async fn attempt(&self, api: &dyn SubscriptionApi, channel_id: &str) -> bool {
        let max_attempts = self.max_attempts();
        let mut attempt = 1;

        loop {
            let outcome = api.ensure_subscribed(channel_id).await;
            self.observer
                .attempt_outcome(channel_id, attempt, max_attempts, &outcome);

            let retry_index = attempt - 1;
            let delay = match outcome.disposition() {
                Disposition::Done => return true,
                Disposition::Permanent => return false,
                Disposition::RetryExponential => rate_limit_backoff(retry_index),
                Disposition::RetryLinear => transient_backoff(retry_index),
            };

            if attempt >= max_attempts {
                debug!(channel_id = %channel_id, attempt, "Retries exhausted");
                return false;
            }

            self.observer
                .retry_scheduled(channel_id, attempt, max_attempts, delay, &outcome);

            if !sleep_or_shutdown(self.shutdown.as_deref(), delay).await {
                debug!(channel_id = %channel_id, attempt, "Backoff interrupted by shutdown");
                return false;
            }

            attempt += 1;
        }
    }
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_retries", &self.max_retries)
            .field("shutdown", &self.shutdown.is_some())
            .finish()
    }
}
