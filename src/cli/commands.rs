//! Action implementations shared by the menu and one-shot subcommands

use super::args::Action;
use super::error::CliError;
use super::progress::ProgressBarObserver;
use crate::auth::Authenticator;
use crate::client::{SubscriptionApi, YouTubeClient};
use crate::config::AppConfig;
use crate::extract::extract_subscriptions;
use crate::resume::{ProgressLedger, ProgressRecord, RunLock};
use crate::shutdown::SharedShutdown;
use crate::snapshot::SnapshotStore;
use crate::transfer::{RetryPolicy, TransferEngine, TransferStatistics};
use crate::{AccountRole, SubscriptionRecord};
use dialoguer::Confirm;
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{info, warn};

/// Channels listed by the view action
const VIEW_PREVIEW_COUNT: usize = 10;

/// Runs named actions against the configured data directory
pub struct App {
    config: AppConfig,
    shutdown: SharedShutdown,
    resume: bool,
    prompts: bool,
}

impl App {
    /// Create an app; prompts are enabled by default
    pub fn new(config: AppConfig, shutdown: SharedShutdown) -> Self {
        Self {
            config,
            shutdown,
            resume: false,
            prompts: true,
        }
    }

    /// Make the import action resume from saved progress
    pub fn with_resume(mut self, resume: bool) -> Self {
        self.resume = resume;
        self
    }

    /// Ask for confirmation before destructive or long-running steps
    pub fn with_prompts(mut self, prompts: bool) -> Self {
        self.prompts = prompts;
        self
    }

    /// Configuration in use
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Shutdown handle shared with running transfers
    pub fn shutdown(&self) -> &SharedShutdown {
        &self.shutdown
    }

    /// Whether resume mode was requested on the command line
    pub fn resume_mode(&self) -> bool {
        self.resume
    }

    fn snapshot_store(&self) -> SnapshotStore {
        SnapshotStore::new(self.config.snapshot_path())
    }

    fn ledger(&self) -> ProgressLedger {
        ProgressLedger::new(self.config.progress_path())
    }

    /// Whether an interrupted import left progress behind
    pub fn progress_exists(&self) -> bool {
        self.ledger().exists()
    }

    /// Run one action
    pub async fn dispatch(&self, action: Action) -> Result<(), CliError> {
        match action {
            Action::Extract => self.extract().await.map(|_| ()),
            Action::Import => self.import(self.resume).await.map(|_| ()),
            Action::Resume => self.resume_import().await.map(|_| ()),
            Action::View => {
                self.view();
                Ok(())
            }
            Action::ClearProgress => self.clear_progress().map(|_| ()),
            Action::Exit => Ok(()),
        }
    }

    fn confirm(&self, prompt: &str) -> Result<bool, CliError> {
        if !self.prompts {
            return Ok(true);
        }
        Ok(Confirm::new().with_prompt(prompt).default(false).interact()?)
    }

    async fn connect(&self, role: AccountRole) -> Result<Arc<dyn SubscriptionApi>, CliError> {
        let authenticator = Authenticator::new(&self.config)?;
        let session = authenticator.authorize(role).await?;
        let client = YouTubeClient::new(&session)?;
        let api: Arc<dyn SubscriptionApi> = Arc::new(client);

        match api.channel_info().await {
            Ok(Some(channel)) => {
                info!(role = %role, channel_id = %channel.id, "Authenticated as {}", channel.title);
                println!("Authenticated as: {}", channel.title);
            }
            Ok(None) => warn!(role = %role, "No channel found for the authenticated account"),
            Err(e) => warn!(role = %role, error = %e, "Failed to get channel info"),
        }

        Ok(api)
    }

    /// Extract the source account's subscriptions into the snapshot
    pub async fn extract(&self) -> Result<usize, CliError> {
        println!("\n--- Extracting Subscriptions ---");
        println!("Using the SOURCE account");

        let api = self.connect(AccountRole::Source).await?;
        let subscriptions = extract_subscriptions(
            api.as_ref(),
            self.config.inter_item_delay,
            Some(self.shutdown.as_ref()),
        )
        .await;
        if self.shutdown.is_shutdown_requested() {
            return Err(CliError::Interrupted);
        }
        if subscriptions.is_empty() {
            return Err(CliError::NoSubscriptions);
        }

        self.snapshot_store().save(&subscriptions)?;
        println!(
            "\nSuccess! Extracted and saved {} subscriptions",
            subscriptions.len()
        );
        Ok(subscriptions.len())
    }

    /// Import the snapshot into the destination account
    ///
    /// Returns `None` when the operator declined.
    pub async fn import(&self, resume: bool) -> Result<Option<TransferStatistics>, CliError> {
        println!("\n--- Importing Subscriptions ---");

        let items = self.load_snapshot()?;
        println!("Found {} subscriptions to import", items.len());
        println!("Using the DESTINATION account");

        let prompt = format!("Proceed to subscribe to {} channels?", items.len());
        self.run_transfer(&items, resume, &prompt).await
    }

    /// Continue an interrupted import
    pub async fn resume_import(&self) -> Result<Option<TransferStatistics>, CliError> {
        println!("\n--- Resuming Previous Import ---");

        let Some(progress) = self.ledger().load() else {
            println!("No previous progress found. Use import to start a new transfer.");
            return Ok(None);
        };

        let items = self.load_snapshot()?;
        let remaining = items.len().saturating_sub(progress.next_index());
        println!("Found {} total subscriptions", items.len());
        if progress.last_processed_index >= 0 {
            println!(
                "Last processed: {} (index {})",
                progress.last_channel_id, progress.last_processed_index
            );
        } else {
            println!("No channels were processed before the interruption");
        }
        println!("Remaining to process: {remaining}");
        println!("Using the DESTINATION account");

        let prompt = format!("Proceed to resume importing {remaining} remaining channels?");
        self.run_transfer(&items, true, &prompt).await
    }

    fn load_snapshot(&self) -> Result<Vec<SubscriptionRecord>, CliError> {
        let store = self.snapshot_store();
        let items = store.load();
        if items.is_empty() {
            return Err(CliError::NoSnapshot(store.path().to_path_buf()));
        }
        Ok(items)
    }

    async fn run_transfer(
        &self,
        items: &[SubscriptionRecord],
        resume: bool,
        prompt: &str,
    ) -> Result<Option<TransferStatistics>, CliError> {
        let ledger = self.ledger();
        // Held until this function returns
        let _lock = RunLock::try_acquire(ledger.path())?;

        let api = self.connect(AccountRole::Destination).await?;

        if !self.confirm(prompt)? {
            println!("Import cancelled");
            return Ok(None);
        }

        let observer = Arc::new(ProgressBarObserver::new(items.len()));
        let policy = RetryPolicy::new(self.config.max_retries, observer.clone());
        let engine = TransferEngine::new(api, ledger, policy, observer)
            .with_shutdown(self.shutdown.clone());

        let stats = engine
            .run(items, resume, self.config.inter_item_delay)
            .await;

        print!("{}", render_statistics(&stats));
        Ok(Some(stats))
    }

    /// Print the snapshot summary
    pub fn view(&self) {
        println!("\n--- Subscription Data ---");
        let items = self.snapshot_store().load();
        if items.is_empty() {
            println!("No subscription data found");
            return;
        }
        print!("{}", render_summary(&items, self.ledger().load().as_ref()));
    }

    /// Delete saved progress; returns whether it was cleared
    pub fn clear_progress(&self) -> Result<bool, CliError> {
        println!("\n--- Clear Progress ---");
        if !self.confirm("Are you sure you want to clear saved progress?")? {
            println!("Operation cancelled.");
            return Ok(false);
        }

        self.ledger().try_clear()?;
        println!("Progress cleared successfully.");
        Ok(true)
    }
}

/// Text shown by the view action
pub fn render_summary(items: &[SubscriptionRecord], progress: Option<&ProgressRecord>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Total subscriptions: {}", items.len());

    if let Some(progress) = progress {
        let processed = progress.next_index().min(items.len());
        let _ = writeln!(
            out,
            "Progress: {}/{} processed, {} remaining",
            processed,
            items.len(),
            items.len() - processed
        );
    }

    let _ = writeln!(out, "\nFirst {VIEW_PREVIEW_COUNT} channels:");
    for (i, record) in items.iter().take(VIEW_PREVIEW_COUNT).enumerate() {
        let _ = writeln!(out, "{}. {}", i + 1, record.display_name());
    }
    if items.len() > VIEW_PREVIEW_COUNT {
        let _ = writeln!(out, "... and {} more", items.len() - VIEW_PREVIEW_COUNT);
    }
    out
}

/// Text shown after an import
pub fn render_statistics(stats: &TransferStatistics) -> String {
    let mut out = String::new();
    if stats.interrupted {
        let _ = writeln!(out, "\nImport interrupted. Run resume to continue.");
    } else {
        let _ = writeln!(out, "\nImport completed!");
    }
    let _ = writeln!(out, "Successful: {}", stats.successful);
    let _ = writeln!(out, "Already subscribed: {}", stats.already_subscribed);
    let _ = writeln!(out, "Failed: {}", stats.failed);
    if stats.skipped > 0 {
        let _ = writeln!(out, "Skipped: {}", stats.skipped);
    }
    out
}
