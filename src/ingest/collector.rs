//! Collection of closed pull requests across base-branch filters.

use tracing::info;

use crate::github::error::IngestError;
use crate::github::feed::PullRequestFeed;
use crate::github::locator::RepositoryLocator;
use crate::github::models::PullRequestRecord;

/// Walks the paginated closed-pull-request listing for each configured base
/// branch and concatenates the results into one ordered working set.
///
/// Branch filters are iterated in configuration order; within a filter,
/// items keep remote-provided order. There is no re-sorting and no
/// cross-filter deduplication: a pull request matching two filters appears
/// twice and is processed twice downstream.
pub struct ClosedPullRequestCollector<'feed, Feed>
where
    Feed: PullRequestFeed,
{
    feed: &'feed Feed,
    per_page: u8,
}

impl<'feed, Feed> ClosedPullRequestCollector<'feed, Feed>
where
    Feed: PullRequestFeed,
{
    /// Creates a collector reading from the provided feed.
    #[must_use]
    pub const fn new(feed: &'feed Feed, per_page: u8) -> Self {
        Self { feed, per_page }
    }

    /// Collects all closed pull requests for the given base branches.
    ///
    /// # Errors
    ///
    /// Propagates any feed failure unmodified; the orchestrator treats
    /// remote failures here as transient and restarts the pass.
    pub async fn collect(
        &self,
        locator: &RepositoryLocator,
        base_branches: &[String],
    ) -> Result<Vec<PullRequestRecord>, IngestError> {
        let mut pulls: Vec<PullRequestRecord> = Vec::new();

        for branch in base_branches {
            let before = pulls.len();
            let mut page: u32 = 1;
            loop {
                let result = self
                    .feed
                    .closed_pull_requests(locator, branch, page, self.per_page)
                    .await?;
                pulls.extend(result.items);
                if !result.has_next {
                    break;
                }
                page += 1;
            }
            info!(
                branch,
                count = pulls.len() - before,
                "collected closed pull requests"
            );
        }

        info!(total = pulls.len(), "collection complete");
        Ok(pulls)
    }
}

#[cfg(test)]
mod tests {
    use mockall::predicate::{always, eq};

    use super::ClosedPullRequestCollector;
    use crate::github::error::IngestError;
    use crate::github::feed::{MockPullRequestFeed, PullRequestPage};
    use crate::github::locator::RepositoryLocator;
    use crate::github::models::test_support::merged_pull_request;

    fn locator() -> RepositoryLocator {
        RepositoryLocator::from_owner_repo("octo", "radar").expect("locator should build")
    }

    fn branches() -> Vec<String> {
        vec!["main".to_owned(), "master".to_owned()]
    }

    #[tokio::test]
    async fn concatenates_branch_results_in_filter_order() {
        let mut feed = MockPullRequestFeed::new();
        feed.expect_closed_pull_requests()
            .with(always(), eq("main"), eq(1), eq(100))
            .times(1)
            .returning(|_, _, _, _| {
                Ok(PullRequestPage {
                    items: vec![merged_pull_request(3), merged_pull_request(1)],
                    has_next: false,
                })
            });
        feed.expect_closed_pull_requests()
            .with(always(), eq("master"), eq(1), eq(100))
            .times(1)
            .returning(|_, _, _, _| {
                Ok(PullRequestPage {
                    items: vec![merged_pull_request(2)],
                    has_next: false,
                })
            });

        let collector = ClosedPullRequestCollector::new(&feed, 100);
        let pulls = collector
            .collect(&locator(), &branches())
            .await
            .expect("collection should succeed");

        let ids: Vec<u64> = pulls.iter().map(|pr| pr.id).collect();
        assert_eq!(ids, vec![3, 1, 2], "remote order per filter, no sorting");
    }

    #[tokio::test]
    async fn walks_pages_until_the_listing_is_exhausted() {
        let mut feed = MockPullRequestFeed::new();
        feed.expect_closed_pull_requests()
            .with(always(), eq("main"), eq(1), eq(2))
            .times(1)
            .returning(|_, _, _, _| {
                Ok(PullRequestPage {
                    items: vec![merged_pull_request(1), merged_pull_request(2)],
                    has_next: true,
                })
            });
        feed.expect_closed_pull_requests()
            .with(always(), eq("main"), eq(2), eq(2))
            .times(1)
            .returning(|_, _, _, _| {
                Ok(PullRequestPage {
                    items: vec![merged_pull_request(3)],
                    has_next: false,
                })
            });

        let collector = ClosedPullRequestCollector::new(&feed, 2);
        let pulls = collector
            .collect(&locator(), &["main".to_owned()])
            .await
            .expect("collection should succeed");
        assert_eq!(pulls.len(), 3);
    }

    #[tokio::test]
    async fn duplicate_across_filters_is_kept_twice() {
        let mut feed = MockPullRequestFeed::new();
        feed.expect_closed_pull_requests()
            .with(always(), eq("main"), eq(1), eq(100))
            .returning(|_, _, _, _| {
                Ok(PullRequestPage {
                    items: vec![merged_pull_request(7)],
                    has_next: false,
                })
            });
        feed.expect_closed_pull_requests()
            .with(always(), eq("master"), eq(1), eq(100))
            .returning(|_, _, _, _| {
                Ok(PullRequestPage {
                    items: vec![merged_pull_request(7)],
                    has_next: false,
                })
            });

        let collector = ClosedPullRequestCollector::new(&feed, 100);
        let pulls = collector
            .collect(&locator(), &branches())
            .await
            .expect("collection should succeed");

        let ids: Vec<u64> = pulls.iter().map(|pr| pr.id).collect();
        assert_eq!(ids, vec![7, 7]);
    }

    #[tokio::test]
    async fn feed_failures_propagate_unmodified() {
        let mut feed = MockPullRequestFeed::new();
        feed.expect_closed_pull_requests().returning(|_, _, _, _| {
            Err(IngestError::Network {
                message: "connection reset".to_owned(),
            })
        });

        let collector = ClosedPullRequestCollector::new(&feed, 100);
        let error = collector
            .collect(&locator(), &branches())
            .await
            .expect_err("collection should fail");
        assert!(error.is_transient());
    }
}
