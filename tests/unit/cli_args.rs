//! Unit tests for command line parsing and derived configuration

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use youtube_subscription_transfer::cli::{Action, Cli};

#[test]
fn test_cli_defaults_to_three_retries() {
    let cli = Cli::parse_from(["youtube-subscription-transfer", "import"]);

    assert_eq!(cli.max_retries, 3, "Default max_retries should be 3");
    assert_eq!(cli.action, Some(Action::Import));
}

#[test]
fn test_cli_respects_custom_max_retries() {
    let cli = Cli::parse_from([
        "youtube-subscription-transfer",
        "--max-retries",
        "7",
        "resume",
    ]);

    assert_eq!(cli.max_retries, 7);
    assert_eq!(cli.to_config().max_retries, 7);
}

#[test]
fn test_wait_becomes_inter_item_delay() {
    let cli = Cli::parse_from(["youtube-subscription-transfer", "--wait", "2.25"]);

    assert_eq!(cli.to_config().inter_item_delay, Duration::from_millis(2250));
    assert!(!cli.wait_is_excessive());
}

#[test]
fn test_zero_wait_allowed() {
    let cli = Cli::parse_from(["youtube-subscription-transfer", "--wait", "0"]);

    assert!(cli.to_config().inter_item_delay.is_zero());
}

#[test]
fn test_negative_wait_rejected() {
    assert!(Cli::try_parse_from(["youtube-subscription-transfer", "--wait=-0.5"]).is_err());
    assert!(Cli::try_parse_from(["youtube-subscription-transfer", "--wait", "NaN"]).is_err());
}

#[test]
fn test_unrepresentable_wait_rejected() {
    let err = Cli::try_parse_from(["youtube-subscription-transfer", "--wait", "1e20"]).unwrap_err();
    assert!(err.to_string().contains("too large"));

    // Large but representable waits only warn
    let cli = Cli::parse_from(["youtube-subscription-transfer", "--wait", "86400"]);
    assert!(cli.wait_is_excessive());
    assert_eq!(cli.to_config().inter_item_delay, Duration::from_secs(86400));
}

#[test]
fn test_resume_flag_is_global() {
    let cli = Cli::parse_from(["youtube-subscription-transfer", "import", "--resume"]);

    assert!(cli.resume);
    assert_eq!(cli.action, Some(Action::Import));
}

#[test]
fn test_data_dir_locates_every_file() {
    let cli = Cli::parse_from(["youtube-subscription-transfer", "--data-dir", "/srv/yt"]);
    let config = cli.to_config();

    assert_eq!(config.data_dir(), PathBuf::from("/srv/yt"));
    assert_eq!(
        config.progress_path(),
        PathBuf::from("/srv/yt/transfer_progress.json")
    );
    assert_eq!(
        config.credentials_path,
        PathBuf::from("/srv/yt/credentials.json")
    );
    assert!(config.metrics_addr.is_none());
}

#[test]
fn test_metrics_addr_parsed() {
    let cli = Cli::parse_from([
        "youtube-subscription-transfer",
        "--metrics-addr",
        "127.0.0.1:9100",
    ]);

    assert_eq!(
        cli.to_config().metrics_addr,
        Some("127.0.0.1:9100".parse().unwrap())
    );
    assert!(Cli::try_parse_from(["youtube-subscription-transfer", "--metrics-addr", "nope"]).is_err());
}

#[test]
fn test_menu_offers_resume_only_with_progress() {
    assert_eq!(
        Action::menu(false),
        vec![Action::Extract, Action::Import, Action::View, Action::Exit]
    );
    assert_eq!(
        Action::menu(true),
        vec![
            Action::Extract,
            Action::Import,
            Action::Resume,
            Action::View,
            Action::ClearProgress,
            Action::Exit,
        ]
    );
}
