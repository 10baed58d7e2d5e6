//! hwbot CLI
//!
//! Main entry point for watching homework review statuses.

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use hwbot_orchestrator::{
    check_credentials, Config, Credentials, HwbotError, Poller, ReviewApiClient,
    TelegramMessenger,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// hwbot - Homework Review Watcher
///
/// Polls the homework review API and sends a chat message whenever the
/// review status of the latest submission changes.
#[derive(Parser, Debug)]
#[command(name = "hwbot")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (default: hwbot.json in current directory)
    #[arg(short, long, value_name = "FILE")]
    config: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long)]
    verbose: bool,

    /// Seconds between polling cycles (overrides the config file)
    #[arg(short, long, value_name = "SECS")]
    interval: Option<u64>,

    /// Run a single cycle and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if args.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stdout)
        .init();

    // A missing .env file is fine; the variables may come from the environment.
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!(error = %e, "No .env file loaded");
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if is_fatal(&e) {
                tracing::error!(severity = "critical", "{e}");
            } else {
                tracing::error!("{e:#}");
            }
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

/// Loads configuration, checks credentials, and drives the poller.
async fn run(args: Args) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;

    if let Some(interval) = args.interval {
        config.poll_interval_secs = interval;
    }
    config.validate()?;

    let config = config.with_credentials(Credentials::from_env());
    let missing = config.credentials.missing();

    if !check_credentials(&config) {
        return Err(HwbotError::missing_credentials(missing).into());
    }
    if !missing.is_empty() {
        tracing::warn!(missing = ?missing, "Some environment variables are not set");
    }

    tracing::info!(
        endpoint = %config.endpoint,
        interval_secs = config.poll_interval_secs,
        timeout_secs = config.request_timeout_secs,
        cursor_mode = ?config.cursor_mode,
        locale = ?config.locale,
        "hwbot starting"
    );

    let api = ReviewApiClient::from_config(&config)?;
    let messenger = TelegramMessenger::from_config(&config)?;
    let mut poller = Poller::new(&config, api, messenger);

    if args.once {
        let outcome = poller.run_cycle().await;
        tracing::info!(?outcome, "Single cycle finished");
        return Ok(());
    }

    let shutdown = CancellationToken::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Received Ctrl+C, shutting down"),
            Err(e) => tracing::error!(error = %e, "Failed to listen for Ctrl+C"),
        }
        trigger.cancel();
    });

    poller.run(shutdown).await;
    Ok(())
}

/// Returns `true` for startup failures: missing credentials or bad configuration.
fn is_fatal(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<HwbotError>()
        .is_some_and(HwbotError::is_fatal)
}

/// Loads configuration from the specified path or default location.
fn load_config(config_path: Option<&str>) -> anyhow::Result<Config> {
    match config_path {
        Some(path_str) => {
            let path = Path::new(path_str);
            if !path.exists() {
                anyhow::bail!(
                    "Config file not found: '{}'\n\nSuggestion: Check the path or remove the --config flag to use defaults",
                    path.display()
                );
            }
            Ok(Config::load_from_file(path)?)
        }
        None => Ok(Config::load()?),
    }
}
