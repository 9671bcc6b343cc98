//! Application configuration loaded from CLI, environment, and files.
//!
//! A single struct merges command-line arguments, environment variables, and
//! configuration files using ortho-config's layered approach.
//!
//! # Precedence
//!
//! Configuration values are loaded with the following precedence (lowest to
//! highest):
//!
//! 1. **Defaults** – Built-in application defaults
//! 2. **Configuration file** – `.mergeradar.toml` in current directory, home
//!    directory, or XDG config directory
//! 3. **Environment variables** – `MERGERADAR_REPO`, `MERGERADAR_TOKEN`, or
//!    legacy `GITHUB_TOKEN`
//! 4. **Command-line arguments** – `--repo`/`-r`, `--token`/`-t`, and friends
//!
//! # Configuration File
//!
//! Place `.mergeradar.toml` in the current directory, home directory, or XDG
//! config directory with:
//!
//! ```toml
//! repo = "octocat/hello-world"
//! token = "ghp_example"
//! output_path = "pr_metrics.csv"
//! checkpoint_path = "last_processed_pr.txt"
//! base_branches = ["main", "master"]
//! ```

use std::env;
use std::time::Duration;

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

use crate::github::error::IngestError;
use crate::github::locator::RepositoryLocator;
use crate::ingest::orchestrator::IngestSettings;
use crate::ingest::retry::RetryPolicy;

/// Operation mode determined by CLI arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationMode {
    /// Run the ingestion pipeline against a repository.
    Ingest,
    /// Summarise the existing metric table.
    Report,
}

/// Application configuration supporting CLI, environment, and file sources.
///
/// # Environment Variables
///
/// - `MERGERADAR_REPO` or `--repo`: Repository as `owner/repo` or URL
/// - `MERGERADAR_TOKEN`, `GITHUB_TOKEN`, or `--token`: Authentication token
/// - `MERGERADAR_OUTPUT_PATH` or `--output-path`: Metric table location
/// - `MERGERADAR_CHECKPOINT_PATH` or `--checkpoint-path`: Checkpoint file
/// - `MERGERADAR_PER_PAGE` or `--per-page`: Listing page size
/// - `MERGERADAR_RETRY_BACKOFF_SECONDS` or `--retry-backoff-seconds`:
///   Delay between restarted passes
/// - `MERGERADAR_MAX_RETRIES` or `--max-retries`: Retry bound (unbounded
///   when unset)
#[derive(Debug, Clone, Deserialize, Serialize, OrthoConfig)]
#[serde(default)]
#[ortho_config(
    prefix = "MERGERADAR",
    discovery(
        dotfile_name = ".mergeradar.toml",
        config_file_name = "mergeradar.toml",
        app_name = "mergeradar"
    )
)]
pub struct MergeradarConfig {
    /// Repository to ingest, as `owner/repo` or a GitHub URL.
    ///
    /// Can be provided via:
    /// - CLI: `--repo <REPO>` or `-r <REPO>`
    /// - Environment: `MERGERADAR_REPO`
    /// - Config file: `repo = "..."`
    #[ortho_config(cli_short = 'r')]
    pub repo: Option<String>,

    /// Personal access token for GitHub API authentication.
    ///
    /// Can be provided via:
    /// - CLI: `--token <TOKEN>` or `-t <TOKEN>`
    /// - Environment: `MERGERADAR_TOKEN` or `GITHUB_TOKEN` (legacy)
    /// - Config file: `token = "..."`
    #[ortho_config(cli_short = 't')]
    pub token: Option<String>,

    /// Path of the CSV metric table the pipeline appends to.
    #[ortho_config()]
    pub output_path: Utf8PathBuf,

    /// Path of the plain-text checkpoint file.
    #[ortho_config()]
    pub checkpoint_path: Utf8PathBuf,

    /// Base-branch filters applied to the closed-pull-request listing,
    /// iterated in order.
    #[ortho_config()]
    pub base_branches: Vec<String>,

    /// Page size for the closed-pull-request listing (GitHub caps at 100).
    #[ortho_config()]
    pub per_page: u8,

    /// Seconds to wait before restarting a pass after a transient failure.
    #[ortho_config()]
    pub retry_backoff_seconds: u64,

    /// Maximum pass restarts before giving up; unbounded when unset.
    #[ortho_config()]
    pub max_retries: Option<u32>,

    /// Summarises the existing metric table instead of ingesting.
    ///
    /// Can be provided via:
    /// - CLI: `--report`
    /// - Config file: `report = true`
    ///
    /// Note: `ortho_config` does not load boolean values from the
    /// environment, so `MERGERADAR_REPORT` is not supported.
    #[ortho_config()]
    pub report: bool,
}

const DEFAULT_OUTPUT_PATH: &str = "pr_metrics.csv";
const DEFAULT_CHECKPOINT_PATH: &str = "last_processed_pr.txt";
const DEFAULT_PER_PAGE: u8 = 100;
const DEFAULT_RETRY_BACKOFF_SECONDS: u64 = 3600;

impl Default for MergeradarConfig {
    fn default() -> Self {
        Self {
            repo: None,
            token: None,
            output_path: Utf8PathBuf::from(DEFAULT_OUTPUT_PATH),
            checkpoint_path: Utf8PathBuf::from(DEFAULT_CHECKPOINT_PATH),
            base_branches: vec!["main".to_owned(), "master".to_owned()],
            per_page: DEFAULT_PER_PAGE,
            retry_backoff_seconds: DEFAULT_RETRY_BACKOFF_SECONDS,
            max_retries: None,
            report: false,
        }
    }
}

impl MergeradarConfig {
    /// Resolves the token from configuration or the legacy `GITHUB_TOKEN`
    /// environment variable.
    ///
    /// If no token is provided via `MERGERADAR_TOKEN`, the CLI, or a
    /// configuration file, this method falls back to reading `GITHUB_TOKEN`
    /// from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::MissingToken`] when no token source provides a
    /// value.
    pub fn resolve_token(&self) -> Result<String, IngestError> {
        self.token
            .clone()
            .or_else(|| env::var("GITHUB_TOKEN").ok())
            .ok_or(IngestError::MissingToken)
    }

    /// Parses the configured repository reference into a locator.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::MissingRepository`] when no repository is
    /// configured, or a parse error for a malformed reference.
    pub fn require_repository(&self) -> Result<RepositoryLocator, IngestError> {
        let reference = self
            .repo
            .as_deref()
            .ok_or(IngestError::MissingRepository)?;
        RepositoryLocator::from_reference(reference)
    }

    /// Determines the operation mode based on provided configuration.
    #[must_use]
    pub const fn operation_mode(&self) -> OperationMode {
        if self.report {
            OperationMode::Report
        } else {
            OperationMode::Ingest
        }
    }

    /// Builds the pipeline settings from the configured values.
    #[must_use]
    pub fn ingest_settings(&self) -> IngestSettings {
        IngestSettings {
            table_path: self.output_path.clone(),
            base_branches: self.base_branches.clone(),
            per_page: self.per_page,
            retry: RetryPolicy::new(
                Duration::from_secs(self.retry_backoff_seconds),
                self.max_retries,
            ),
        }
    }
}
