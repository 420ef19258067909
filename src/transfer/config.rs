//! Transfer configuration constants

use std::time::Duration;

/// Default number of retries after the first attempt.
/// 3 retries gives 4 attempts, enough to ride out a short throttling window
/// (5 + 10 + 20 = 35s of rate-limit waits) without stalling a large import.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Base delay for rate-limit backoff in milliseconds, doubled per retry
pub const RATE_LIMIT_BASE_MS: u64 = 5_000; // 5 seconds

/// Base delay for transient-error backoff in milliseconds, grows linearly
pub const TRANSIENT_BASE_MS: u64 = 2_000; // 2 seconds

/// Maximum backoff delay in milliseconds.
/// Only reachable with a raised retry bound (rate-limit retry 6 = 320s).
pub const MAX_BACKOFF_MS: u64 = 300_000; // 5 minutes

/// Emit a batch progress summary every N processed items
pub const PROGRESS_SUMMARY_INTERVAL: usize = 10;

/// Page size for subscription listing (API maximum)
pub const PAGE_SIZE: u32 = 50;

/// Upper bound of the pause between listing pages
pub const MAX_PAGE_DELAY: Duration = Duration::from_millis(100);

/// Per-request timeout for API calls
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default courtesy delay between items in seconds
pub const DEFAULT_INTER_ITEM_DELAY_SECS: f64 = 0.5;

/// Inter-item delays above this many seconds trigger a warning
pub const LONG_DELAY_WARNING_SECS: f64 = 60.0;

/// Backoff after a rate-limited attempt: 5s, 10s, 20s, ...
pub fn rate_limit_backoff(retry_index: u32) -> Duration {
    let delay_ms = 2u64
        .checked_pow(retry_index)
        .and_then(|factor| factor.checked_mul(RATE_LIMIT_BASE_MS))
        .unwrap_or(MAX_BACKOFF_MS)
        .min(MAX_BACKOFF_MS);
    Duration::from_millis(delay_ms)
}

/// Backoff after a transient failure: 2s, 4s, 6s, ...
pub fn transient_backoff(retry_index: u32) -> Duration {
    let delay_ms = TRANSIENT_BASE_MS
        .saturating_mul(u64::from(retry_index) + 1)
        .min(MAX_BACKOFF_MS);
    Duration::from_millis(delay_ms)
}
