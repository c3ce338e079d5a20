//! Command-line entry point for the donor harvester

use clap::Parser;
use galang_harvest::config::load_config_with_hash;
use galang_harvest::harvest::Harvester;
use galang_harvest::model::RunStatus;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Galang-Harvest: incremental crowdfunding donor harvester
///
/// Walks each selected campaign's donor list page by page, persisting every
/// page and tracking progress in a resume ledger so interrupted runs pick up
/// where they stopped.
#[derive(Parser, Debug)]
#[command(name = "galang-harvest")]
#[command(version = "0.1.0")]
#[command(about = "Incremental crowdfunding donor harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Ignore recorded resume points and walk from the stream head
    #[arg(long)]
    fresh: bool,

    /// Walk only this campaign instead of the reconciled worklist
    #[arg(long, value_name = "ID")]
    campaign: Option<String>,

    /// Show the reconciled worklist without fetching anything
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show ledger progress and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let harvester = Arc::new(Harvester::new(config)?);

    if cli.dry_run {
        handle_dry_run(&harvester)?;
    } else if cli.stats {
        handle_stats(&harvester)?;
    } else {
        handle_harvest(&harvester, cli.fresh, cli.campaign).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("galang_harvest=info,warn"),
            1 => EnvFilter::new("galang_harvest=debug,info"),
            2 => EnvFilter::new("galang_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles --dry-run: shows the reconciled worklist without fetching
fn handle_dry_run(harvester: &Harvester) -> anyhow::Result<()> {
    let worklist = harvester.worklist()?;

    println!("=== Worklist (dry run) ===\n");
    if worklist.is_empty() {
        println!("Nothing to scrape, every candidate campaign is complete.");
        return Ok(());
    }

    println!("{} campaign(s) to scrape:", worklist.len());
    for campaign_id in &worklist {
        match harvester.resume_cursor(campaign_id)? {
            Some(cursor) => println!("  - {} (resume from {})", campaign_id, cursor),
            None => println!("  - {} (fresh)", campaign_id),
        }
    }

    Ok(())
}

/// Handles --stats: prints ledger progress
fn handle_stats(harvester: &Harvester) -> anyhow::Result<()> {
    let entries = harvester.progress_entries()?;

    println!("=== Ledger progress ===\n");
    if entries.is_empty() {
        println!("No campaigns attempted yet.");
        return Ok(());
    }

    let complete = entries.iter().filter(|e| e.is_complete()).count();
    println!(
        "{} campaign(s) tracked, {} complete\n",
        entries.len(),
        complete
    );
    for entry in entries {
        let state = if entry.is_complete() { "complete" } else { "partial" };
        println!(
            "  {} - {} pages, {} (updated {})",
            entry.campaign_id, entry.pages_persisted, state, entry.updated_at
        );
    }

    Ok(())
}

/// Handles the main harvest operation
async fn handle_harvest(
    harvester: &Arc<Harvester>,
    fresh: bool,
    campaign: Option<String>,
) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();

    // Ctrl-C ends the batch cooperatively; the ledger keeps resume points
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, finishing in-flight pages then stopping");
            signal_cancel.cancel();
        }
    });

    match campaign {
        Some(campaign_id) => {
            let run = harvester.run_campaign(&campaign_id, fresh, &cancel).await?;
            match run.status {
                RunStatus::Completed => {
                    println!("{}: completed, {} pages", campaign_id, run.pages_fetched)
                }
                _ => println!(
                    "{}: aborted after {} pages, resume recorded",
                    campaign_id, run.pages_fetched
                ),
            }
        }
        None => {
            let report = harvester.run(fresh, &cancel).await?;
            println!("{}", report.summary());
        }
    }

    Ok(())
}
