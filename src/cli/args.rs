//! Command line arguments

use crate::config::AppConfig;
use crate::transfer::config::{DEFAULT_INTER_ITEM_DELAY_SECS, LONG_DELAY_WARNING_SECS};
use clap::{Parser, Subcommand};
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Parse and validate the inter-item wait in seconds
fn parse_wait(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number of seconds"))?;

    if !value.is_finite() {
        return Err("wait time must be a finite number".to_string());
    }
    if value < 0.0 {
        return Err("wait time cannot be negative".to_string());
    }
    if Duration::try_from_secs_f64(value).is_err() {
        return Err(format!("wait time of {value} seconds is too large"));
    }
    Ok(value)
}

/// Transfer YouTube subscriptions from one account to another
#[derive(Parser, Debug)]
#[command(name = "youtube-subscription-transfer")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Action to run once; without it an interactive menu is shown
    #[command(subcommand)]
    pub action: Option<Action>,

    /// Resume a previous import from saved progress
    #[arg(long, global = true, default_value_t = false)]
    pub resume: bool,

    /// Seconds to wait between subscription calls (default: 0.5)
    #[arg(long, global = true, default_value_t = DEFAULT_INTER_ITEM_DELAY_SECS, value_parser = parse_wait)]
    pub wait: f64,

    /// Interactive mode
    #[arg(long, global = true, default_value_t = true, action = clap::ArgAction::Set)]
    pub interactive: bool,

    /// Maximum number of retries per channel (default: 3, range: 1-20)
    #[arg(long, global = true, default_value = "3", value_parser = clap::value_parser!(u32).range(1..=20))]
    pub max_retries: u32,

    /// Directory for the snapshot, progress, tokens and log file
    #[arg(long, global = true, default_value = ".")]
    pub data_dir: PathBuf,

    /// OAuth client secrets file (default: <data-dir>/credentials.json)
    #[arg(long, global = true)]
    pub credentials: Option<PathBuf>,

    /// Expose Prometheus metrics on this address (e.g., 127.0.0.1:9090)
    #[arg(long, global = true)]
    pub metrics_addr: Option<SocketAddr>,
}

impl Cli {
    /// Runtime configuration described by these arguments
    pub fn to_config(&self) -> AppConfig {
        let mut config = AppConfig::new(&self.data_dir)
            .with_inter_item_delay(Duration::try_from_secs_f64(self.wait).unwrap_or_default())
            .with_max_retries(self.max_retries)
            .with_metrics_addr(self.metrics_addr);

        if let Some(credentials) = &self.credentials {
            config = config.with_credentials_path(credentials);
        }
        config
    }

    /// Whether the wait is long enough to make imports very slow
    pub fn wait_is_excessive(&self) -> bool {
        self.wait > LONG_DELAY_WARNING_SECS
    }
}

/// Named actions offered by the tool
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Extract subscriptions from the source account
    Extract,
    /// Import subscriptions to the destination account
    Import,
    /// Resume a previous import
    Resume,
    /// View saved subscription data
    View,
    /// Clear saved progress
    ClearProgress,
    /// Exit
    Exit,
}

impl Action {
    /// Menu label
    pub fn label(&self) -> &'static str {
        match self {
            Action::Extract => "Extract subscriptions from source account",
            Action::Import => "Import subscriptions to destination account",
            Action::Resume => "Resume previous import (recommended)",
            Action::View => "View saved subscription data",
            Action::ClearProgress => "Clear saved progress",
            Action::Exit => "Exit",
        }
    }

    /// Actions to offer, depending on whether saved progress exists
    pub fn menu(progress_exists: bool) -> Vec<Action> {
        let mut actions = vec![Action::Extract, Action::Import];
        if progress_exists {
            actions.push(Action::Resume);
        }
        actions.push(Action::View);
        if progress_exists {
            actions.push(Action::ClearProgress);
        }
        actions.push(Action::Exit);
        actions
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
