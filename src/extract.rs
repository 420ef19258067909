//! Paginated export of the authenticated account's subscriptions

use crate::client::SubscriptionApi;
use crate::metrics;
use crate::shutdown::{sleep_or_shutdown, ShutdownCoordinator};
use crate::transfer::config::MAX_PAGE_DELAY;
use crate::SubscriptionRecord;
use std::time::Duration;
use tracing::{error, info, warn};

/// Read every subscription of the account behind `api`
///
/// Pages are followed until the API stops returning a next-page token, with
/// a pause of `min(page_delay, 100ms)` between pages. An error part-way logs
/// and returns what was collected so far, as does a shutdown request or a
/// next-page token identical to the one just sent.
pub async fn extract_subscriptions(
    api: &dyn SubscriptionApi,
    page_delay: Duration,
    shutdown: Option<&ShutdownCoordinator>,
) -> Vec<SubscriptionRecord> {
    let page_delay = page_delay.min(MAX_PAGE_DELAY);
    let mut subscriptions = Vec::new();
    let mut page_token: Option<String> = None;
    let mut page = 0usize;

    info!("Extracting subscriptions from source account");

    loop {
        if shutdown.is_some_and(|shutdown| shutdown.is_shutdown_requested()) {
            warn!(
                page,
                collected = subscriptions.len(),
                "Shutdown requested; stopping extraction"
            );
            break;
        }

        page += 1;
        let result = api.list_subscriptions_page(page_token.as_deref()).await;

        let batch = match result {
            Ok(batch) => batch,
            Err(e) => {
                error!(
                    page,
                    collected = subscriptions.len(),
                    error = %e,
                    "Failed to fetch subscriptions page; keeping partial results"
                );
                break;
            }
        };

        let count = batch.items.len();
        subscriptions.extend(batch.items);
        metrics::record_extracted(count);
        info!(
            page,
            count,
            total = subscriptions.len(),
            "Fetched {} subscriptions (total: {})",
            count,
            subscriptions.len()
        );

        let Some(next) = batch.next_page_token.filter(|token| !token.is_empty()) else {
            break;
        };
        if page_token.as_deref() == Some(next.as_str()) {
            warn!(
                page,
                token = %next,
                "API repeated the page token it was given; stopping extraction"
            );
            break;
        }
        page_token = Some(next);

        if !page_delay.is_zero() {
            sleep_or_shutdown(shutdown, page_delay).await;
        }
    }

    info!(total = subscriptions.len(), "Extraction finished");
    subscriptions
}
