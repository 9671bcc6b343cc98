//! Per-pull-request metric extraction.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::github::error::IngestError;
use crate::github::feed::PullRequestFeed;
use crate::github::locator::RepositoryLocator;
use crate::github::models::PullRequestRecord;
use crate::persistence::table::MetricRow;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Computes one [`MetricRow`] for a merged pull request.
///
/// Fetches the commit collection, then each commit's statistics. A
/// statistics fetch that times out is absorbed: its additions and deletions
/// are simply missing from the totals while the row is still emitted. Any
/// other fetch failure escalates to the pass level.
pub struct MetricExtractor<'feed, Feed>
where
    Feed: PullRequestFeed,
{
    feed: &'feed Feed,
}

impl<'feed, Feed> MetricExtractor<'feed, Feed>
where
    Feed: PullRequestFeed,
{
    /// Creates an extractor reading from the provided feed.
    #[must_use]
    pub const fn new(feed: &'feed Feed) -> Self {
        Self { feed }
    }

    /// Extracts the metric row for one merged pull request.
    ///
    /// Returns `Ok(None)` when the pull request has zero fetched commits or
    /// lacks the timestamps needed to anchor the metric; the caller still
    /// advances the checkpoint past it.
    ///
    /// The integration window opens at the first commit in remote-returned
    /// order, not the earliest authored one. This matches the historical
    /// metric and must not be "fixed" without recomputing old rows.
    ///
    /// # Errors
    ///
    /// Propagates commit-collection failures and any statistics failure that
    /// is not a timeout.
    pub async fn extract(
        &self,
        locator: &RepositoryLocator,
        pull_request: &PullRequestRecord,
    ) -> Result<Option<MetricRow>, IngestError> {
        let commits = self
            .feed
            .pull_request_commits(locator, pull_request.number)
            .await?;

        if commits.is_empty() {
            debug!(
                pr = pull_request.number,
                "pull request has no commits; skipping"
            );
            return Ok(None);
        }

        let mut total_additions: u64 = 0;
        let mut total_deletions: u64 = 0;
        for commit in &commits {
            match self.feed.commit_stats(locator, &commit.sha).await {
                Ok(stats) => {
                    total_additions += stats.additions;
                    total_deletions += stats.deletions;
                }
                Err(error) if error.is_partial_gap() => {
                    warn!(
                        pr = pull_request.number,
                        sha = commit.sha,
                        "statistics fetch timed out; omitting commit from totals"
                    );
                }
                Err(error) => return Err(error),
            }
        }

        let Some(merged_at) = pull_request.merged_at else {
            warn!(
                pr = pull_request.number,
                "merged pull request carries no merge timestamp; skipping"
            );
            return Ok(None);
        };
        let Some(first_authored) = commits.first().and_then(|commit| commit.authored_at) else {
            warn!(
                pr = pull_request.number,
                "first commit carries no author timestamp; skipping"
            );
            return Ok(None);
        };

        Ok(Some(MetricRow {
            merge_date: merged_at,
            time_to_integration_days: elapsed_days(first_authored, merged_at),
            commit_count: u64::try_from(commits.len()).unwrap_or(u64::MAX),
            total_additions,
            total_deletions,
            total_lines_changed: total_additions + total_deletions,
        }))
    }
}

/// Elapsed time between two instants in fractional days.
#[expect(
    clippy::cast_precision_loss,
    clippy::float_arithmetic,
    reason = "fractional days are inherently floating point; second precision is ample"
)]
fn elapsed_days(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_seconds() as f64 / SECONDS_PER_DAY
}
