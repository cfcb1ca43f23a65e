//! quadwatch CLI
//!
//! Runs one storefront check per invocation; scheduling is left to cron or CI.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use quadwatch::{
    error::Result,
    models::Config,
    notify::{Delivery, SmsNotifier},
    pipeline::{PageStatus, RunOutcome, Tracker},
    services::{MerchExtractor, TourExtractor},
    storage::{LocalStorage, StateStore},
    utils::http::{HttpFetcher, PageFetcher},
};

/// quadwatch - storefront merch and tour tracker
#[derive(Parser, Debug)]
#[command(
    name = "quadwatch",
    version,
    about = "Watches an artist storefront for new merch, restocks and tour dates"
)]
struct Cli {
    /// Path to an optional TOML configuration file
    #[arg(short, long, default_value = "quadwatch.toml")]
    config: PathBuf,

    /// Override the state file location
    #[arg(long, global = true)]
    state_file: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch both pages, notify on changes and save the new state
    Check,

    /// Print what the extractor sees on one page
    Extract {
        #[arg(long, value_enum)]
        page: Page,

        /// Read markup from a local file instead of fetching it
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Validate configuration
    Validate,

    /// Show the stored state
    Info,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Page {
    Merch,
    Tour,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn load_config(path: &Path) -> Result<Config> {
    let config = if path.exists() {
        log::info!("Loading configuration from {}", path.display());
        Config::load(path)?
    } else {
        log::debug!("No config file at {}, using defaults", path.display());
        Config::default()
    };
    Ok(config.with_env())
}

/// Main entry point for the CLI application.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(&cli.config)?;
    let state_path = cli
        .state_file
        .clone()
        .unwrap_or_else(|| config.storage.state_path());
    let storage = LocalStorage::new(&state_path);

    match cli.command {
        Command::Check => {
            config.validate()?;
            log::info!("Starting {} website check...", config.notify.artist);

            let fetcher = HttpFetcher::from_config(&config.http)?;
            let notifier = SmsNotifier::new(fetcher.client().clone(), &config.notify);
            if !notifier.is_configured() {
                log::warn!("SMS credentials missing; notifications will only be logged");
            }

            let tracker = Tracker::new(&config, &fetcher, &notifier, &storage)?;
            let report = tracker.run()?;

            for (page, status) in [("merch", &report.merch), ("tour", &report.tour)] {
                match status {
                    PageStatus::Success { records: 0 } => {
                        log::warn!("{} page: no records found; selectors may be stale", page)
                    }
                    PageStatus::Success { .. } => {}
                    PageStatus::Failed { reason } => {
                        log::warn!("{} page kept previous state: {}", page, reason)
                    }
                }
            }

            match &report.outcome {
                RunOutcome::FirstRun => log::info!("Baseline saved to {}", state_path.display()),
                RunOutcome::Changed { delivery, .. } => match delivery {
                    Some(Delivery::Sent { .. }) => {
                        log::info!("Changes detected! Notifications sent.")
                    }
                    Some(Delivery::Skipped) => {
                        log::info!("Changes detected! SMS not configured; message logged only.")
                    }
                    None => log::warn!("Changes detected, but the notification failed."),
                },
                RunOutcome::Unchanged => log::info!("No changes detected."),
            }
            log::info!("Check completed successfully.");
        }

        Command::Extract { page, file } => {
            let url = match page {
                Page::Merch => &config.site.merch_url,
                Page::Tour => &config.site.tour_url,
            };
            let html = match file {
                Some(path) => fs::read_to_string(path)?,
                None => HttpFetcher::from_config(&config.http)?.fetch(url)?,
            };

            let json = match page {
                Page::Merch => {
                    let items = MerchExtractor::new(&config.extraction, &config.site.base_url)?
                        .extract(&html);
                    log::info!("{} product(s)", items.len());
                    serde_json::to_string_pretty(&items)?
                }
                Page::Tour => {
                    let dates = TourExtractor::new(&config.extraction)?.extract(&html);
                    log::info!("{} tour date(s)", dates.len());
                    serde_json::to_string_pretty(&dates)?
                }
            };
            println!("{json}");
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK (site URLs, selectors and markers)");
            log::info!(
                "SMS delivery: {}",
                if config.notify.credentials.is_some() {
                    "configured"
                } else {
                    "not configured (messages will be logged)"
                }
            );
        }

        Command::Info => {
            log::info!("State file: {}", state_path.display());
            if !state_path.exists() {
                log::info!("No state saved yet.");
                return Ok(());
            }

            let state = storage.load()?;
            log::info!(
                "Merch hash: {}",
                state.merch_hash.as_deref().unwrap_or("none")
            );
            log::info!("Tour hash: {}", state.tour_hash.as_deref().unwrap_or("none"));
            log::info!(
                "Merch items: {} ({} sold out)",
                state.merch_items.len(),
                state.sold_out_count()
            );
            log::info!("Tour dates: {}", state.tour_dates.len());
        }
    }

    Ok(())
}
