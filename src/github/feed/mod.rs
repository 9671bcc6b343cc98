//! Remote feed of pull request data.
//!
//! The ingestion pipeline talks to GitHub through the [`PullRequestFeed`]
//! trait so tests can mock the remote collection while the Octocrab-backed
//! implementation handles real HTTP requests.

mod client;
mod error_mapping;
mod octocrab_feed;

pub use octocrab_feed::OctocrabFeed;

use async_trait::async_trait;

use crate::github::error::IngestError;
use crate::github::locator::RepositoryLocator;
use crate::github::models::{CommitStats, CommitSummary, PullRequestRecord};

/// One page of closed pull requests in remote-provided order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestPage {
    /// Pull requests on this page.
    pub items: Vec<PullRequestRecord>,
    /// Whether another page follows this one.
    pub has_next: bool,
}

/// Feed exposing the three remote operations the pipeline consumes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PullRequestFeed: Send + Sync {
    /// Fetch one page of closed pull requests filtered by base branch.
    ///
    /// Items are returned in remote-provided order; the collector walks
    /// pages until `has_next` is false.
    async fn closed_pull_requests(
        &self,
        locator: &RepositoryLocator,
        base_branch: &str,
        page: u32,
        per_page: u8,
    ) -> Result<PullRequestPage, IngestError>;

    /// Fetch the full commit collection for a pull request.
    async fn pull_request_commits(
        &self,
        locator: &RepositoryLocator,
        number: u64,
    ) -> Result<Vec<CommitSummary>, IngestError>;

    /// Fetch line statistics for a single commit by SHA.
    ///
    /// A timed-out fetch surfaces as [`IngestError::StatsTimeout`] so the
    /// extractor can skip the contribution instead of failing the pass.
    async fn commit_stats(
        &self,
        locator: &RepositoryLocator,
        sha: &str,
    ) -> Result<CommitStats, IngestError>;
}
