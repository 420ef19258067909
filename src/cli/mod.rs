//! CLI command implementations

pub mod args;
pub mod commands;
pub mod error;
pub mod menu;
pub mod progress;

pub use args::{Action, Cli};
pub use commands::App;
pub use error::CliError;
pub use menu::run_menu;
pub use progress::ProgressBarObserver;
