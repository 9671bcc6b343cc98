//! Mergeradar CLI entrypoint for pull-request metric ingestion.

use std::io::{self, Write};
use std::process::ExitCode;

use mergeradar::{
    FileCheckpointStore, IngestError, IngestionPipeline, MergeradarConfig, OctocrabFeed,
    OperationMode, PersonalAccessToken, render_report,
};
use ortho_config::OrthoConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            if writeln!(io::stderr().lock(), "{error}").is_err() {
                return ExitCode::FAILURE;
            }
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();
}

async fn run() -> Result<(), IngestError> {
    let config = load_config()?;

    match config.operation_mode() {
        OperationMode::Report => {
            let report = render_report(&config.output_path)?;
            write_stdout(&report)
        }
        OperationMode::Ingest => ingest(&config).await,
    }
}

async fn ingest(config: &MergeradarConfig) -> Result<(), IngestError> {
    let locator = config.require_repository()?;
    let token = PersonalAccessToken::new(config.resolve_token()?)?;

    let feed = OctocrabFeed::for_token(&token, &locator)?;
    let checkpoint = FileCheckpointStore::new(config.checkpoint_path.clone());
    let pipeline = IngestionPipeline::new(&feed, &checkpoint, config.ingest_settings());

    let summary = pipeline.run(&locator).await?;
    write_stdout(&format!(
        "Processed {} pull requests ({} rows written) into '{}'\n",
        summary.processed, summary.rows_written, config.output_path
    ))
}

/// Loads configuration from CLI, environment, and files.
///
/// # Errors
///
/// Returns [`IngestError::Configuration`] when ortho-config fails to parse
/// arguments or load configuration files.
fn load_config() -> Result<MergeradarConfig, IngestError> {
    MergeradarConfig::load().map_err(|error| IngestError::Configuration {
        message: error.to_string(),
    })
}

fn write_stdout(message: &str) -> Result<(), IngestError> {
    let mut stdout = io::stdout().lock();
    write!(stdout, "{message}").map_err(|error| IngestError::Io {
        message: error.to_string(),
    })
}
