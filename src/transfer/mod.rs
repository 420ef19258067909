//! Batch transfer of subscriptions to the destination account
//!
//! - [`RetryPolicy`] wraps one subscribe call with outcome-aware backoff
//! - [`TransferEngine`] walks the list, persisting progress before each item
//! - [`TransferObserver`] receives every event the run produces

pub mod config;
pub mod engine;
pub mod observer;
pub mod retry;
pub mod stats;

pub use engine::TransferEngine;
pub use observer::{TracingObserver, TransferObserver};
pub use retry::RetryPolicy;
pub use stats::{ItemResult, TransferStatistics};
