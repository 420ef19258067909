//! Interactive menu loop

use super::args::Action;
use super::commands::App;
use super::error::CliError;
use crate::transfer::config::DEFAULT_INTER_ITEM_DELAY_SECS;
use dialoguer::Select;
use std::time::Duration;
use tracing::error;

/// Show the menu until the operator exits
///
/// A failing action is reported and the menu continues; only prompt
/// failures end the loop.
pub async fn run_menu(app: &App) -> Result<(), CliError> {
    println!("=== YouTube Subscription Transfer Tool ===");
    println!("This tool helps transfer subscriptions between YouTube accounts.");
    if app.resume_mode() {
        println!("[RESUME MODE ENABLED]");
    }
    if app.config().inter_item_delay != Duration::from_secs_f64(DEFAULT_INTER_ITEM_DELAY_SECS) {
        println!(
            "[CUSTOM WAIT TIME: {}s between API calls]",
            app.config().inter_item_delay.as_secs_f64()
        );
    }

    loop {
        let actions = Action::menu(app.progress_exists());
        println!();
        let selection = Select::new()
            .with_prompt("Choose an option")
            .items(&actions)
            .default(0)
            .interact()?;

        let action = actions[selection];
        if action == Action::Exit {
            println!("Goodbye!");
            return Ok(());
        }

        if let Err(e) = app.dispatch(action).await {
            error!("{} failed: {}", action.label(), e);
            println!("Error: {e}");
        }

        if app.shutdown().is_shutdown_requested() {
            println!("Shutdown requested. Goodbye!");
            return Ok(());
        }
    }
}
