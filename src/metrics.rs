//! Production metrics for subscription transfers
//!
//! ## Architecture
//!
//! - Uses `metrics` crate for low-overhead metric collection
//! - Prometheus exporter for a scrape endpoint, installed only on request
//! - Without an installed recorder every macro below is a no-op

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::Lazy;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Global metrics registry initialization flag
static METRICS_INITIALIZED: Lazy<Arc<RwLock<bool>>> = Lazy::new(|| Arc::new(RwLock::new(false)));

/// Initialize metrics system with Prometheus exporter
///
/// Idempotent; later calls are ignored.
///
/// # Arguments
/// * `addr` - Socket address to bind Prometheus scrape endpoint (e.g., "0.0.0.0:9090")
pub async fn init_metrics(addr: SocketAddr) -> Result<(), Box<dyn std::error::Error>> {
    let mut initialized = METRICS_INITIALIZED.write().await;
    if *initialized {
        debug!("Metrics already initialized, skipping");
        return Ok(());
    }

    info!("Initializing metrics system on {}", addr);

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {e}"))?;

    describe_counter!(
        "subscriptions_processed_total",
        Unit::Count,
        "Items processed by the transfer engine, by result"
    );

    describe_counter!(
        "subscription_attempts_total",
        Unit::Count,
        "Subscribe calls made, by classified outcome"
    );

    describe_counter!(
        "subscription_retries_total",
        Unit::Count,
        "Retries scheduled, by reason"
    );

    describe_histogram!(
        "retry_backoff_duration_seconds",
        Unit::Seconds,
        "Duration of retry backoff in seconds"
    );

    describe_counter!(
        "subscriptions_extracted_total",
        Unit::Count,
        "Subscriptions read from the source account"
    );

    describe_counter!(
        "transfer_runs_total",
        Unit::Count,
        "Transfer runs finished, by completion status"
    );

    *initialized = true;
    info!("Metrics system initialized successfully on {}", addr);
    Ok(())
}

/// Record the final result of one item ("successful", "failed", "already_subscribed")
pub fn record_item_result(result: &'static str) {
    counter!("subscriptions_processed_total", "result" => result).increment(1);
}

/// Record one classified subscribe call
pub fn record_attempt(outcome: &'static str) {
    counter!("subscription_attempts_total", "outcome" => outcome).increment(1);
}

/// Record a scheduled retry and its wait
pub fn record_retry(reason: &'static str, delay: Duration) {
    counter!("subscription_retries_total", "reason" => reason).increment(1);
    histogram!("retry_backoff_duration_seconds", "reason" => reason).record(delay.as_secs_f64());
}

/// Record subscriptions read from one listing page
pub fn record_extracted(count: usize) {
    counter!("subscriptions_extracted_total").increment(count as u64);
}

/// Record the end of a transfer run
pub fn record_run_finished(interrupted: bool) {
    let status = if interrupted { "interrupted" } else { "completed" };
    counter!("transfer_runs_total", "status" => status).increment(1);
}
