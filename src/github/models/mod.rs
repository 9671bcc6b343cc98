//! Data models for pull requests, commits, and per-commit statistics.
//!
//! Types prefixed with `Api` are internal deserialisation targets that
//! convert into the public domain types.

use chrono::{DateTime, Utc};
use serde::Deserialize;

#[cfg(feature = "test-support")]
pub mod test_support;

/// A closed pull request as returned by the listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestRecord {
    /// Stable pull request identifier, unique across retries. This is the
    /// checkpoint cursor, not the human-facing number.
    pub id: u64,
    /// Pull request number used in commit-collection paths.
    pub number: u64,
    /// Merge timestamp; `None` for closed-but-unmerged pull requests.
    pub merged_at: Option<DateTime<Utc>>,
    /// Base branch the pull request targeted.
    pub base_branch: Option<String>,
}

impl PullRequestRecord {
    /// Returns true when the pull request was merged.
    ///
    /// The listing endpoint carries no `merged` boolean; for closed pull
    /// requests a present merge timestamp is equivalent.
    #[must_use]
    pub const fn is_merged(&self) -> bool {
        self.merged_at.is_some()
    }
}

/// One commit in a pull request's commit collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitSummary {
    /// Commit SHA, unique within the pull request.
    pub sha: String,
    /// Commit author timestamp.
    pub authored_at: Option<DateTime<Utc>>,
}

/// Line statistics for a single commit, fetched lazily by SHA.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitStats {
    /// Lines added by the commit.
    pub additions: u64,
    /// Lines deleted by the commit.
    pub deletions: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiPullRequest {
    pub(super) id: u64,
    pub(super) number: u64,
    pub(super) merged_at: Option<DateTime<Utc>>,
    pub(super) base: Option<ApiBaseRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiBaseRef {
    #[serde(rename = "ref")]
    pub(super) branch: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiCommit {
    pub(super) sha: String,
    pub(super) commit: Option<ApiCommitDetail>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiCommitDetail {
    pub(super) author: Option<ApiCommitAuthor>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiCommitAuthor {
    pub(super) date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiCommitWithStats {
    pub(super) stats: Option<ApiStats>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiStats {
    pub(super) additions: Option<u64>,
    pub(super) deletions: Option<u64>,
}

impl From<ApiPullRequest> for PullRequestRecord {
    fn from(value: ApiPullRequest) -> Self {
        Self {
            id: value.id,
            number: value.number,
            merged_at: value.merged_at,
            base_branch: value.base.and_then(|base| base.branch),
        }
    }
}

impl From<ApiCommit> for CommitSummary {
    fn from(value: ApiCommit) -> Self {
        Self {
            sha: value.sha,
            authored_at: value
                .commit
                .and_then(|detail| detail.author)
                .and_then(|author| author.date),
        }
    }
}

impl From<ApiCommitWithStats> for CommitStats {
    fn from(value: ApiCommitWithStats) -> Self {
        value.stats.map_or_else(Self::default, |stats| Self {
            additions: stats.additions.unwrap_or(0),
            deletions: stats.deletions.unwrap_or(0),
        })
    }
}
