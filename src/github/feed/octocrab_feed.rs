//! Octocrab implementation of the pull request feed.

use async_trait::async_trait;
use octocrab::{Octocrab, Page};
use tracing::warn;

use crate::github::error::IngestError;
use crate::github::locator::{PersonalAccessToken, RepositoryLocator};
use crate::github::models::{
    ApiCommit, ApiCommitWithStats, ApiPullRequest, CommitStats, CommitSummary, PullRequestRecord,
};
use crate::github::rate_limit::RateLimitInfo;

use super::client::build_octocrab_client;
use super::error_mapping::{is_rate_limit_error, is_timeout_error, map_octocrab_error};
use super::{PullRequestFeed, PullRequestPage};

/// Items requested per page when walking a pull request's commit collection.
const COMMITS_PER_PAGE: u8 = 100;

/// Octocrab-backed feed.
pub struct OctocrabFeed {
    client: Octocrab,
}

impl OctocrabFeed {
    /// Creates a new feed from an Octocrab client.
    #[must_use]
    pub const fn new(client: Octocrab) -> Self {
        Self { client }
    }

    /// Builds an Octocrab client for the given token and repository locator.
    ///
    /// # Errors
    ///
    /// Returns `IngestError::InvalidUrl` when the base URI cannot be parsed
    /// or `IngestError::Api` when Octocrab fails to construct a client.
    pub fn for_token(
        token: &PersonalAccessToken,
        locator: &RepositoryLocator,
    ) -> Result<Self, IngestError> {
        let octocrab = build_octocrab_client(token, locator.api_base().as_str())?;
        Ok(Self::new(octocrab))
    }

    /// Maps an octocrab error, enriching rate limit rejections with the
    /// current quota so the retry log can report the reset time.
    async fn map_error_with_rate_limit(
        &self,
        operation: &str,
        error: &octocrab::Error,
    ) -> IngestError {
        match error {
            octocrab::Error::GitHub { source, .. } if is_rate_limit_error(source) => {
                let rate_limit = self.fetch_rate_limit_info().await;
                let base_message =
                    format!("{operation} failed: {message}", message = source.message);
                let message = match &rate_limit {
                    Some(info) => {
                        warn!(
                            limit = info.limit(),
                            remaining = info.remaining(),
                            reset_in_secs = info.seconds_until_reset(),
                            "{operation} hit the rate limit"
                        );
                        if info.is_exhausted() {
                            format!(
                                "{base_message} (quota exhausted, resets at {reset})",
                                reset = info.reset_at()
                            )
                        } else {
                            format!(
                                "{base_message} (resets at {reset})",
                                reset = info.reset_at()
                            )
                        }
                    }
                    None => base_message,
                };

                IngestError::RateLimitExceeded {
                    rate_limit,
                    message,
                }
            }
            _ => map_octocrab_error(operation, error),
        }
    }

    async fn fetch_rate_limit_info(&self) -> Option<RateLimitInfo> {
        let rate = self.client.ratelimit().get().await.ok()?.rate;
        let Ok(limit) = u32::try_from(rate.limit) else {
            return None;
        };
        let Ok(remaining) = u32::try_from(rate.remaining) else {
            return None;
        };
        Some(RateLimitInfo::new(limit, remaining, rate.reset))
    }
}

#[async_trait]
impl PullRequestFeed for OctocrabFeed {
    async fn closed_pull_requests(
        &self,
        locator: &RepositoryLocator,
        base_branch: &str,
        page: u32,
        per_page: u8,
    ) -> Result<PullRequestPage, IngestError> {
        let page_str = page.to_string();
        let per_page_str = per_page.to_string();
        let query_params = [
            ("state", "closed"),
            ("base", base_branch),
            ("page", page_str.as_str()),
            ("per_page", per_page_str.as_str()),
        ];

        let page_result: Page<ApiPullRequest> = match self
            .client
            .get(locator.pulls_path(), Some(&query_params))
            .await
        {
            Ok(page_result) => page_result,
            Err(error) => {
                return Err(self.map_error_with_rate_limit("list pulls", &error).await);
            }
        };

        let has_next = page_result.next.is_some();
        let items: Vec<PullRequestRecord> = page_result
            .items
            .into_iter()
            .map(ApiPullRequest::into)
            .collect();

        Ok(PullRequestPage { items, has_next })
    }

    async fn pull_request_commits(
        &self,
        locator: &RepositoryLocator,
        number: u64,
    ) -> Result<Vec<CommitSummary>, IngestError> {
        let path = locator.pull_commits_path(number);
        let per_page_str = COMMITS_PER_PAGE.to_string();
        let mut commits: Vec<CommitSummary> = Vec::new();
        let mut page_number: u32 = 1;

        loop {
            let page_str = page_number.to_string();
            let query_params = [
                ("page", page_str.as_str()),
                ("per_page", per_page_str.as_str()),
            ];

            let page_result: Page<ApiCommit> =
                match self.client.get(&path, Some(&query_params)).await {
                    Ok(page_result) => page_result,
                    Err(error) => {
                        return Err(self
                            .map_error_with_rate_limit("list pull commits", &error)
                            .await);
                    }
                };

            let has_next = page_result.next.is_some();
            commits.extend(page_result.items.into_iter().map(ApiCommit::into));

            if !has_next {
                break;
            }
            page_number += 1;
        }

        Ok(commits)
    }

    async fn commit_stats(
        &self,
        locator: &RepositoryLocator,
        sha: &str,
    ) -> Result<CommitStats, IngestError> {
        match self
            .client
            .get::<ApiCommitWithStats, _, _>(locator.commit_path(sha), None::<&()>)
            .await
        {
            Ok(commit) => Ok(commit.into()),
            Err(error) if is_timeout_error(&error) => Err(IngestError::StatsTimeout {
                sha: sha.to_owned(),
                message: error.to_string(),
            }),
            Err(error) => Err(self.map_error_with_rate_limit("fetch commit", &error).await),
        }
    }
}
