//! Ranzen - a KLAPP inbox watcher for the command line
//!
//! Polls the KLAPP parent API for unread messages, prints inbox
//! reports and acknowledges messages on request.

use anyhow::Result;
use clap::{Parser, Subcommand};
use klapp::{
    ActionHandler, InboxSnapshot, KlappClient, KlappError, KlappSettings, MessageId, Poller,
};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::{Arc, mpsc};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "ranzen")]
#[command(about = "KLAPP inbox watcher (poller + read receipts)", long_about = None)]
struct Cli {
    /// Settings file to use instead of the default location
    #[arg(long, global = true, value_name = "FILE")]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Poll the inbox on a schedule until interrupted
    Watch {
        /// Seconds between refreshes (defaults to the configured interval)
        #[arg(long)]
        interval: Option<u64>,
    },

    /// Fetch unread messages once and print a JSON report
    Check,

    /// Acknowledge a single message
    MarkRead {
        /// Id of the message to acknowledge
        id: String,
    },

    /// Acknowledge every unread message currently tracked
    MarkAllRead,
}

fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    // Bootstrap config directory
    if let Err(e) = config::init() {
        error!("Failed to initialize config directory: {}", e);
    }

    let cli = Cli::parse();
    let settings = load_settings(cli.settings.as_deref())?;
    let client = build_client(&settings);

    match cli.cmd {
        Command::Watch { interval } => watch(client, &settings, interval),
        Command::Check => check(&client),
        Command::MarkRead { id } => {
            let id = MessageId::from(id);
            with_handler(client, &settings, move |handler| handler.mark_read(&id))
        }
        Command::MarkAllRead => with_handler(client, &settings, |handler| {
            let count = handler.mark_all_read()?;
            info!("{} messages acknowledged", count);
            Ok(())
        }),
    }
}

/// Load settings from the given file, or from the default locations
fn load_settings(path: Option<&Path>) -> Result<KlappSettings> {
    if let Some(path) = path {
        return KlappSettings::from_file(path);
    }

    match KlappSettings::load() {
        Ok(settings) => Ok(settings),
        Err(e) => {
            warn!("KLAPP settings not found: {}", e);
            if let Some(path) = KlappSettings::default_settings_path() {
                warn!(
                    "To configure KLAPP access, either:\n\
                     1. Place your account settings at: {}\n\
                     2. Or set environment variables: KLAPP_EMAIL and KLAPP_PASSWORD",
                    path.display()
                );
            }
            Err(e)
        }
    }
}

fn build_client(settings: &KlappSettings) -> KlappClient {
    match &settings.base_url {
        Some(base_url) => {
            KlappClient::with_base_url(settings.account(), settings.lookback_days, base_url)
        }
        None => KlappClient::new(settings.account(), settings.lookback_days),
    }
}

/// Run the poller until Ctrl-C
fn watch(client: KlappClient, settings: &KlappSettings, interval: Option<u64>) -> Result<()> {
    let interval = interval
        .map(Duration::from_secs)
        .unwrap_or_else(|| settings.poll_interval());

    let client = Arc::new(client);
    let poller = Poller::start(Arc::clone(&client), interval)?;
    info!(
        "watching {} every {}s ({} unread right now)",
        settings.email,
        interval.as_secs(),
        poller.snapshot().unread_count()
    );

    let (shutdown_tx, shutdown_rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = shutdown_tx.send(());
    })?;

    let _ = shutdown_rx.recv();
    info!("shutting down");
    poller.stop();
    client.close();
    Ok(())
}

/// Fetch once and print the report as JSON
fn check(client: &KlappClient) -> Result<()> {
    let messages = client.get_unread_messages()?;
    let report = InboxSnapshot::fresh(messages).report();
    println!("{}", serde_json::to_string_pretty(&report)?);
    client.close();
    Ok(())
}

/// Run one handler command against a freshly started poller
fn with_handler<F>(client: KlappClient, settings: &KlappSettings, run: F) -> Result<()>
where
    F: FnOnce(&ActionHandler) -> Result<(), KlappError>,
{
    let client = Arc::new(client);
    let poller = Arc::new(Poller::start(Arc::clone(&client), settings.poll_interval())?);
    let handler = ActionHandler::new(Arc::clone(&client), Arc::clone(&poller));

    let result = run(&handler);
    client.close();
    result?;
    Ok(())
}
