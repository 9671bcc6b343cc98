//! GitHub-facing layer: locators, domain models, and the remote feed.
//!
//! This module wraps Octocrab behind the [`feed::PullRequestFeed`] trait,
//! parses repository references, and maps remote failures into the
//! [`IngestError`] taxonomy the ingestion pipeline retries on.

pub mod error;
pub mod feed;
pub mod locator;
pub mod models;
pub mod rate_limit;

pub use error::IngestError;
pub use feed::{OctocrabFeed, PullRequestFeed, PullRequestPage};
pub use locator::{PersonalAccessToken, RepositoryLocator, RepositoryName, RepositoryOwner};
pub use models::{CommitStats, CommitSummary, PullRequestRecord};
pub use rate_limit::RateLimitInfo;

#[cfg(test)]
pub use feed::MockPullRequestFeed;
