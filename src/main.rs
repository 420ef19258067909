//! Main entry point for the youtube-subscription-transfer CLI

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use youtube_subscription_transfer::cli::{run_menu, App, Cli};
use youtube_subscription_transfer::config::{AppConfig, LOG_FILE};
use youtube_subscription_transfer::metrics::init_metrics;
use youtube_subscription_transfer::shutdown::ShutdownCoordinator;

/// Initialize tracing: stderr (optionally JSON) plus the log file in the data dir
///
/// The returned guard flushes the file writer on drop and must outlive `main`'s work.
fn init_tracing(config: &AppConfig) -> Option<WorkerGuard> {
    let json_format = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("youtube_subscription_transfer=info"));

    let (file_layer, guard) = match std::fs::create_dir_all(config.data_dir()) {
        Ok(()) => {
            let appender = tracing_appender::rolling::never(config.data_dir(), LOG_FILE);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        Err(_) => (None, None),
    };

    let registry = tracing_subscriber::registry().with(filter).with(file_layer);

    if json_format {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    guard
}

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();
    let config = cli.to_config();

    let log_guard = init_tracing(&config);
    if log_guard.is_some() {
        info!(path = %config.log_path().display(), "Logging to file");
    }

    if cli.wait_is_excessive() {
        warn!(
            wait_secs = cli.wait,
            "Wait time > 60 seconds may cause very slow imports"
        );
    }

    if let Some(addr) = config.metrics_addr {
        if let Err(e) = init_metrics(addr).await {
            warn!(error = %e, "Metrics exporter unavailable, continuing without it");
        }
    }

    // Ctrl+C stops a running import between items and extraction between pages
    let shutdown = ShutdownCoordinator::shared();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Ctrl+C received - saving progress...");
                shutdown.request_shutdown();
            }
            // Progress is saved before every attempt, so a second Ctrl+C exits at once
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Second Ctrl+C received - exiting");
                std::process::exit(130);
            }
        }
    });

    // A named action runs once without confirmations
    let app = App::new(config, shutdown).with_resume(cli.resume);
    let result = match cli.action {
        Some(action) => app
            .with_prompts(false)
            .dispatch(action)
            .await
            .with_context(|| format!("{} failed", action.label())),
        None => run_menu(&app).await.context("Interactive menu failed"),
    };

    if let Err(e) = result {
        error!("Command failed: {:#}", e);
        drop(log_guard);
        std::process::exit(1);
    }
}
