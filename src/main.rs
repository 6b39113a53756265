//! mei-rs: watches published statistical series and keeps their data files.
//!
//! Once a day each configured series page is read for its release date,
//! next release date and downloadable CSV/XLS files. Release changes are
//! recorded in a JSON state document, every advertised file is fetched into
//! `<data dir>/<series>/<FORMAT>/<day>.<FORMAT>`, and the outcome of the last
//! download is kept next to the release dates.

#![warn(clippy::all)]

mod cli;
mod config;
mod download;
mod driver;
mod fetch;
mod http;
mod shutdown;
mod state;
#[cfg(test)]
mod testutil;
mod types;
mod updater;

use std::time::Duration;

use chrono::Local;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::Command;
use state::types::format_day;
use state::{JsonStateStore, StateStore};

/// Run the status command.
async fn run_status(cli: &cli::Cli, args: cli::StatusArgs) -> anyhow::Result<()> {
    let state_path = config::expand_tilde(&cli.state_file);
    let data_dir = config::expand_tilde(&cli.data_dir);

    if !state_path.exists() {
        println!("No state document found at {}", state_path.display());
        println!("Run an update first to create it.");
        return Ok(());
    }

    let store = JsonStateStore::open(&state_path, &data_dir).await?;
    let doc = store.snapshot().await;

    println!("State document: {}", store.path().display());
    println!("Last processed: {}", format_day(doc.last_processed));
    println!();

    let mut shown = 0;
    for (id, record) in &doc.series {
        if args.failed && record.last_download_error.is_none() {
            continue;
        }
        shown += 1;
        println!("{}", id);
        println!("  Release:         {}", record.last_release_date);
        println!("  Next release:    {}", record.next_release_date);
        println!(
            "  Last downloaded: {}",
            format_day(record.last_downloaded_date)
        );
        if let Some(error) = &record.last_download_error {
            println!("  Last error:      {}", error);
        }
    }

    if shown == 0 {
        if args.failed {
            println!("No series with a failed download.");
        } else {
            println!("No series recorded yet.");
        }
    }

    Ok(())
}

/// Run the daily update.
async fn run_update(cli: &cli::Cli, args: cli::RunArgs) -> anyhow::Result<()> {
    let config = config::Config::from_cli(cli, args)?;
    tracing::debug!(?config, "Starting mei-rs");

    let source = http::HttpSource::new(Duration::from_secs(config.timeout_secs))?;
    let shutdown_token = shutdown::install_signal_handler();
    let today = Local::now().date_naive();

    let report =
        driver::run_configured(&config, &source, &source, today, &shutdown_token).await?;

    match report {
        driver::RunReport::AlreadyProcessed { .. } => Ok(()),
        driver::RunReport::Completed { processed, failed } if failed.is_empty() => {
            tracing::info!(processed, "All series processed");
            Ok(())
        }
        driver::RunReport::Completed { failed, .. } => {
            anyhow::bail!("{} series failed: {}", failed.len(), failed.join(", "))
        }
        driver::RunReport::Interrupted { processed } => {
            anyhow::bail!(
                "Interrupted after {} series; the day was not marked as processed",
                processed
            )
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli.log_level.as_filter())),
        )
        .init();

    match cli.effective_command() {
        Command::Status(args) => run_status(&cli, args).await,
        Command::Run(args) => run_update(&cli, args).await,
    }
}
