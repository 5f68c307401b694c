//! noticewatch CLI
//!
//! One invocation performs one pass; periodic execution is left to the
//! external scheduler (cron, CI schedule, ...).

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use noticewatch::{
    error::{AppError, Result},
    models::{Config, Route},
    notify,
    pipeline::{self, Budget, RunMode, RunReport, Watcher},
    services::{Classification, Classify, ExistenceClassifier, TitleExtractor},
    storage::{CheckpointStore, LocalStorage},
    utils::url::parse_target,
};

/// noticewatch - Notice Board Watcher
#[derive(Parser, Debug)]
#[command(
    name = "noticewatch",
    version,
    about = "Watches a notice board by probing item identifiers"
)]
struct Cli {
    /// Path to storage directory holding config.toml and the checkpoint
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one polling pass (bootstrap when no checkpoint exists)
    Run {
        /// Log notifications instead of sending them
        #[arg(long)]
        dry_run: bool,
    },

    /// Classify a single identifier or item URL
    Probe {
        /// Identifier or item URL
        target: String,
    },

    /// Discover the current frontier regardless of the checkpoint
    Discover {
        /// Store the frontier as checkpoint if it is higher than the current one
        #[arg(long)]
        write: bool,
    },

    /// Validate configuration files
    Validate,

    /// Show checkpoint and last run info
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn log_report(report: &RunReport) {
    log::info!("Run summary ({:?})", report.mode);
    log::info!("    checkpoint: {:?} → {:?}", report.checkpoint_before, report.checkpoint_after);
    log::info!("    probes: {}", report.probes);
    log::info!(
        "    delivered: {}/{}",
        report.delivered.len(),
        report.discovered
    );
    if let Some(reason) = report.stop_reason {
        log::info!("    stopped: {}", reason.as_str());
    }
    log::info!(
        "    elapsed: {}ms",
        (report.finished_at - report.started_at).num_milliseconds()
    );
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    log::info!("noticewatch starting...");

    let config_path = cli.storage_dir.join("config.toml");
    let config = Config::load_or_default(&config_path).with_env_overrides();

    log::info!("Loaded configuration from {}", cli.storage_dir.display());

    let storage = LocalStorage::new(&cli.storage_dir);

    match cli.command {
        Command::Run { dry_run } => {
            let classifier = ExistenceClassifier::from_config(&config)?;
            let notifier = notify::from_config(&config, dry_run)?;

            let report = Watcher::new(&config, &classifier, &storage, notifier.as_ref())
                .run_once()
                .await?;

            storage.save_report(&report).await?;
            log_report(&report);

            if let Some(error) = report.error {
                return Err(match report.mode {
                    RunMode::Bootstrap => AppError::bootstrap(error),
                    RunMode::Scan => AppError::Notify(error),
                });
            }
        }

        Command::Probe { target } => {
            let id = parse_target(&target).ok_or_else(|| {
                AppError::validation(format!("'{}' is neither an identifier nor an item URL", target))
            })?;
            let classifier = ExistenceClassifier::from_config(&config)?;

            log::info!("Probing {}", config.board.item_url(id));
            match classifier.classify(id).await {
                Classification::Exists { title } => log::info!("{}: exists - {}", id, title),
                other => log::info!("{}: {}", id, other.label()),
            }
        }

        Command::Discover { write } => {
            let classifier = ExistenceClassifier::from_config(&config)?;
            let budget = Budget::new(Duration::from_secs(config.run.budget_secs));

            let frontier = pipeline::discover_frontier(&classifier, &config.bootstrap, budget)
                .await
                .ok_or_else(|| AppError::bootstrap("no existing identifier found"))?;

            log::info!(
                "Frontier: {} ({} probes{})",
                frontier.id,
                frontier.probes,
                if frontier.budget_exhausted {
                    ", budget exhausted"
                } else {
                    ""
                }
            );

            if write {
                let current = storage.load().await?;
                if current.is_none_or(|current| frontier.id > current) {
                    storage.save(frontier.id).await?;
                    log::info!("Checkpoint set to {} at {}", frontier.id, storage.location());
                } else {
                    log::warn!(
                        "Checkpoint {:?} is not below the frontier; left unchanged",
                        current
                    );
                }
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            let routes = Route::resolve_all(&config.routes, &config.fetch)?;
            if routes.is_empty() {
                return Err(AppError::config("no usable routes configured"));
            }
            TitleExtractor::new(&config.classify)?;

            log::info!(
                "✓ Config OK ({} usable routes: {})",
                routes.len(),
                routes
                    .iter()
                    .map(|r| r.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }

        Command::Info => {
            log::info!("Storage directory: {}", cli.storage_dir.display());
            log::info!("Board: {} ({})", config.board.name, config.board.item_url_template);

            match storage.load().await? {
                Some(id) => log::info!("Checkpoint: {} ({})", id, config.board.item_url(id)),
                None => log::info!("No checkpoint yet; next run bootstraps."),
            }

            if let Some(report) = storage.load_report().await? {
                if let Some(finished) = report.get("finished_at") {
                    log::info!("Last run: {}", finished);
                }
                if let Some(delivered) = report.get("delivered") {
                    log::info!("Last delivered: {}", delivered);
                }
                if let Some(error) = report.get("error") {
                    log::warn!("Last error: {}", error);
                }
            }
        }
    }

    log::info!("Done!");

    Ok(())
}
