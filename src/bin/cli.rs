//! RHP Finder CLI
//!
//! Local execution entry point for discovery and acquisition runs.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use rhp_finder::{
    error::{AppError, Result},
    models::Config,
    pipeline,
    utils::{Deadline, HttpFetcher},
};
use serde::Serialize;

/// RHP Finder - SEBI offering document discovery
#[derive(Parser, Debug)]
#[command(
    name = "rhp-finder",
    version,
    about = "Find and download RHP/DRHP filings from the SEBI public issues listing"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "data/config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Abort the run after this many seconds (overrides http.run_deadline_secs)
    #[arg(long)]
    deadline_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search the listing and print the discovery outcome
    Search {
        /// Company name to look for
        company: String,
    },

    /// Download the document behind a known filing page
    Download {
        /// Company name, used for the output file name
        company: String,

        /// URL of the filing page
        #[arg(long)]
        url: String,
    },

    /// Search, then download the chosen filing
    Fetch {
        /// Company name to look for
        company: String,
    },

    /// Validate configuration
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool, default_level: &str) {
    let level = if verbose { "debug" } else { default_level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(cli: Cli, config: Config) -> Result<()> {
    let deadline =
        Deadline::from_secs(cli.deadline_secs.unwrap_or(config.http.run_deadline_secs));

    match cli.command {
        Command::Search { company } => {
            let fetcher = HttpFetcher::new(&config.http)?;
            let outcome = pipeline::run_discovery(&fetcher, &config, &company, deadline).await?;
            print_json(&outcome.report())?;
        }

        Command::Download { company, url } => {
            let fetcher = HttpFetcher::new(&config.http)?;
            let result =
                pipeline::run_acquisition(&fetcher, &config, &company, &url, deadline).await?;
            print_json(&result)?;
        }

        Command::Fetch { company } => {
            let fetcher = HttpFetcher::new(&config.http)?;
            let report = pipeline::run_pipeline(&fetcher, &config, &company, deadline).await?;
            print_json(&report)?;
        }

        Command::Validate => {
            log::info!("Validating configuration...");
            config.validate()?;
            log::info!("Config OK");
        }
    }

    Ok(())
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let (config, load_error) = Config::load_or_default(&cli.config);
    init_logging(cli.verbose, &config.logging.level);

    match load_error {
        Some(e) => log::warn!(
            "Config load failed from {}: {}. Using defaults.",
            cli.config.display(),
            e
        ),
        None => log::debug!("Using configuration from {}", cli.config.display()),
    }

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(AppError::Terminal(failure)) => {
            log::error!("{}", failure);
            if let Err(e) = print_json(&failure.report()) {
                log::error!("Could not render failure report: {}", e);
                println!("{}", failure.code());
            }
            ExitCode::from(2)
        }
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
