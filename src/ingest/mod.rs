//! The ingestion pipeline: collect closed pull requests, extract per-pull
//! metrics, append them to the table, and advance the checkpoint.

pub mod collector;
pub mod extractor;
pub mod orchestrator;
pub mod retry;

pub use collector::ClosedPullRequestCollector;
pub use extractor::MetricExtractor;
pub use orchestrator::{IngestSettings, IngestionPipeline, PassSummary};
pub use retry::{DEFAULT_BACKOFF, RetryPolicy};
