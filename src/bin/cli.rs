//! modwatch CLI
//!
//! One invocation is one batch run: fetch the Workshop page, extract the mod
//! count, record it in the date-keyed ledger, and report the day-over-day
//! delta.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use modwatch::{
    ledger::Ledger,
    models::{Config, LookupPolicy},
    notify::{self, ConsoleNotifier},
    pipeline,
    transport::FallbackTransport,
};

/// modwatch - Daily Workshop mod-count tracker
#[derive(Parser, Debug)]
#[command(
    name = "modwatch",
    version,
    about = "Tracks the daily mod count of a Steam Workshop listing"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "data/config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch today's count, record it, and report the delta
    Run {
        /// Override the subject label recorded in the ledger
        #[arg(long)]
        subject: Option<String>,

        /// Override the prior-day lookup policy
        #[arg(long, value_enum)]
        lookup: Option<LookupArg>,

        /// Fetch the page directly, bypassing the mirror route
        #[arg(long)]
        no_mirror: bool,

        /// Skip the bulk SMS extension for this run
        #[arg(long)]
        no_sms: bool,
    },

    /// Print the recorded ledger rows
    Show,

    /// Validate the configuration file
    Validate,
}

/// CLI spelling of the lookup policy.
#[derive(ValueEnum, Clone, Copy, Debug)]
enum LookupArg {
    /// Only a row matching yesterday's date feeds the comparison
    StrictDate,
    /// Legacy: the last row feeds the comparison, whatever its date
    Latest,
}

impl From<LookupArg> for LookupPolicy {
    fn from(arg: LookupArg) -> Self {
        match arg {
            LookupArg::StrictDate => LookupPolicy::StrictDate,
            LookupArg::Latest => LookupPolicy::Latest,
        }
    }
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load_or_default(&cli.config);

    match cli.command {
        Command::Run {
            subject,
            lookup,
            no_mirror,
            no_sms,
        } => {
            if let Some(subject) = subject {
                config.report.subject = subject;
            }
            if let Some(lookup) = lookup {
                config.ledger.lookup = lookup.into();
            }
            if no_mirror {
                config.fetch.use_mirror = false;
            }
            if no_sms {
                config.sms.enabled = false;
            }

            if let Err(e) = run(&config).await {
                // Report exactly once: toast and error stream, then non-zero exit.
                notify::notify_best_effort(
                    &ConsoleNotifier,
                    &config.messages.notify_title_failed,
                    &e.to_string(),
                );
                log::error!("Run failed: {}", e);
                std::process::exit(1);
            }
        }

        Command::Show => {
            if let Err(e) = show(&config) {
                log::error!("{}", e);
                std::process::exit(1);
            }
        }

        Command::Validate => match config.validate() {
            Ok(()) => log::info!("✓ Config OK"),
            Err(e) => {
                log::error!("Config validation failed: {}", e);
                std::process::exit(1);
            }
        },
    }
}

async fn run(config: &Config) -> modwatch::error::Result<()> {
    config.validate()?;

    let transport = FallbackTransport::from_config(&config.fetch)?;
    pipeline::run_once(config, &transport, &ConsoleNotifier).await?;

    log::info!("Done!");
    Ok(())
}

fn show(config: &Config) -> modwatch::error::Result<()> {
    let ledger = Ledger::new(&config.ledger.path);
    let rows = ledger.rows()?;

    if rows.is_empty() {
        log::info!("No records yet in {}", config.ledger.path);
        return Ok(());
    }

    println!("{:>10}  {:<24}  {:>8}", "Date", "Subject", "Count");
    for row in &rows {
        println!("{:>10}  {:<24}  {:>8}", row.date_cell, row.subject, row.count);
    }

    if let Some(latest) = ledger.lookup_latest()? {
        log::info!(
            "Latest: {} = {}",
            latest
                .date
                .map(modwatch::utils::time::date_string)
                .unwrap_or_else(|| "?".to_string()),
            latest.count
        );
    }
    Ok(())
}
