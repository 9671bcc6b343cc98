//! Mergeradar library crate: resumable ingestion of pull-request
//! time-to-integration metrics.
//!
//! The library walks a repository's closed pull requests via Octocrab,
//! computes per-pull-request integration metrics from commit lists and
//! per-commit statistics, appends them to a CSV table, and checkpoints
//! progress so interrupted runs resume where they left off. A report mode
//! summarises the accumulated table per calendar month.

pub mod config;
pub mod github;
pub mod ingest;
pub mod persistence;
pub mod report;

pub use config::{MergeradarConfig, OperationMode};
pub use github::{
    IngestError, OctocrabFeed, PersonalAccessToken, PullRequestFeed, RepositoryLocator,
};
pub use ingest::{IngestSettings, IngestionPipeline, PassSummary, RetryPolicy};
pub use persistence::{CheckpointStore, FileCheckpointStore, MetricRow, MetricTableWriter};
pub use report::render_report;
