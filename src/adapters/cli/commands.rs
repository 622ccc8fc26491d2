//! CLI Command Handlers
//!
//! Implementation of all CLI commands for the harvester.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::adapters::coingecko::CoinGeckoClient;
use crate::adapters::storage::{JsonCheckpointFile, JsonDocumentStore};
use crate::application::{HarvestSettings, IngestPipeline};
use crate::config::{load_or_default, Config};
use crate::domain::Checkpoint;
use crate::ports::CheckpointStore;

/// gecko-harvest - resumable CoinGecko market + metadata harvester
#[derive(Parser, Debug)]
#[command(
    name = "gecko-harvest",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = "Resumable CoinGecko market + metadata harvester",
    long_about = "Fetches the top coins by market cap from CoinGecko, looks up each coin's \
                  details, and writes the merged records to a JSON document. Progress is \
                  checkpointed after every flush so an interrupted run resumes where it stopped."
)]
pub struct CliApp {
    /// The command to execute (default: run)
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to configuration file (defaults are used when omitted)
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch listings and details, resuming from the checkpoint
    Run(RunCmd),

    /// Show checkpoint and document size
    Status(StatusCmd),

    /// Delete the checkpoint so the next run starts over
    Reset(ResetCmd),
}

/// Run the ingestion
#[derive(Parser, Debug, Default)]
pub struct RunCmd {
    /// Ignore and discard the checkpoint; start with an empty document
    #[arg(long)]
    pub fresh: bool,
}

/// Show progress
#[derive(Parser, Debug)]
pub struct StatusCmd {}

/// Discard progress
#[derive(Parser, Debug)]
pub struct ResetCmd {}

/// Dispatch a parsed command line
pub async fn execute(app: CliApp) -> Result<()> {
    let config = load_or_default(app.config.as_deref()).context("Failed to load configuration")?;

    match app.command.unwrap_or(Command::Run(RunCmd::default())) {
        Command::Run(cmd) => run_command(&config, cmd).await,
        Command::Status(_) => status_command(&config),
        Command::Reset(_) => reset_command(&config),
    }
}

async fn run_command(config: &Config, cmd: RunCmd) -> Result<()> {
    tracing::info!("Starting gecko-harvest...");

    let client = CoinGeckoClient::with_config(config.coingecko())
        .context("Failed to create CoinGecko client")?;

    let mut checkpoints = JsonCheckpointFile::new(config.output.progress_path());
    if cmd.fresh {
        checkpoints.clear().context("Failed to discard checkpoint")?;
    }

    // Keep earlier entries only when a checkpoint says they belong to this job
    let data_path = config.output.data_path();
    let coins = if checkpoints.load().context("Failed to read checkpoint")?.is_some() {
        JsonDocumentStore::open(&data_path).context("Failed to open coin document")?
    } else {
        JsonDocumentStore::create(&data_path)
    };

    let settings = HarvestSettings::from(config);
    let mut pipeline = IngestPipeline::new(client, coins, checkpoints, settings);

    let summary = pipeline.run().await.map_err(|e| {
        tracing::error!("Error fetching coin data: {}", e);
        e
    })?;

    tracing::info!(
        "Coin data for {} coins saved to {}",
        summary.document_len,
        data_path.display()
    );
    Ok(())
}

fn status_command(config: &Config) -> Result<()> {
    let checkpoints = JsonCheckpointFile::new(config.output.progress_path());
    let checkpoint = checkpoints.load().context("Failed to read checkpoint")?;
    let data_path = config.output.data_path();
    let document = JsonDocumentStore::read(&data_path).context("Failed to read coin document")?;

    match checkpoint {
        Some(c) => println!(
            "Checkpoint: last processed index {} (next run starts at {})",
            c.last_processed_index,
            Checkpoint::resume_index(Some(c))
        ),
        None => println!("Checkpoint: none (next run starts at 0)"),
    }
    println!(
        "Document:   {} coins in {}",
        document.map(|d| d.len()).unwrap_or(0),
        data_path.display()
    );

    Ok(())
}

fn reset_command(config: &Config) -> Result<()> {
    let mut checkpoints = JsonCheckpointFile::new(config.output.progress_path());
    checkpoints.clear().context("Failed to delete checkpoint")?;
    println!("Checkpoint cleared: {}", checkpoints.path().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_arguments_defaults_to_run() {
        let app = CliApp::try_parse_from(["gecko-harvest"]).unwrap();
        assert!(app.command.is_none());
        assert!(app.config.is_none());
        assert!(!app.verbose && !app.debug);
    }

    #[test]
    fn test_run_fresh() {
        let app = CliApp::try_parse_from(["gecko-harvest", "run", "--fresh"]).unwrap();
        assert!(matches!(app.command, Some(Command::Run(RunCmd { fresh: true }))));
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let app =
            CliApp::try_parse_from(["gecko-harvest", "status", "--config", "harvest.toml", "-v"])
                .unwrap();
        assert!(matches!(app.command, Some(Command::Status(_))));
        assert_eq!(app.config, Some(PathBuf::from("harvest.toml")));
        assert!(app.verbose);
    }

    #[test]
    fn test_unknown_command_rejected() {
        assert!(CliApp::try_parse_from(["gecko-harvest", "swap"]).is_err());
    }

    #[test]
    fn test_verify_cli() {
        use clap::CommandFactory;
        CliApp::command().debug_assert();
    }
}
