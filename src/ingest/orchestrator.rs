//! End-to-end ingestion pass driving collection, extraction, writing, and
//! checkpointing, wrapped in the transient-failure retry loop.

use camino::Utf8PathBuf;
use tracing::{info, warn};

use crate::github::error::IngestError;
use crate::github::feed::PullRequestFeed;
use crate::github::locator::RepositoryLocator;
use crate::github::models::PullRequestRecord;
use crate::persistence::checkpoint::CheckpointStore;
use crate::persistence::table::MetricTableWriter;

use super::collector::ClosedPullRequestCollector;
use super::extractor::MetricExtractor;
use super::retry::RetryPolicy;

/// Tunables for an ingestion run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestSettings {
    /// Path of the append-only metric table.
    pub table_path: Utf8PathBuf,
    /// Base-branch filters, iterated and concatenated in this order.
    pub base_branches: Vec<String>,
    /// Page size for the closed-pull-request listing.
    pub per_page: u8,
    /// Whole-pass retry policy for transient remote failures.
    pub retry: RetryPolicy,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            table_path: Utf8PathBuf::from("pr_metrics.csv"),
            base_branches: vec!["main".to_owned(), "master".to_owned()],
            per_page: 100,
            retry: RetryPolicy::default(),
        }
    }
}

/// Outcome of a completed ingestion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    /// Pull requests in the collected working set.
    pub collected: usize,
    /// Index at which processing resumed (0 for a fresh run).
    pub resume_index: usize,
    /// Items iterated past the resume point (merged or not).
    pub processed: usize,
    /// Metric rows appended to the table.
    pub rows_written: usize,
    /// Merged pull requests that produced no row.
    pub skipped: usize,
}

/// Drives the ingestion state machine.
///
/// One pass: read the checkpoint, collect the working set, locate the resume
/// point, then per merged item extract, append, and advance the checkpoint
/// (a merged item with no row still advances it; an unmerged one never
/// does). Any
/// transient failure aborts the pass; the run loop sleeps for the configured
/// back-off and restarts from the last durable checkpoint. Local I/O
/// failures are hard errors and never retried.
pub struct IngestionPipeline<'a, Feed, Store>
where
    Feed: PullRequestFeed,
    Store: CheckpointStore,
{
    feed: &'a Feed,
    checkpoint: &'a Store,
    settings: IngestSettings,
}

impl<'a, Feed, Store> IngestionPipeline<'a, Feed, Store>
where
    Feed: PullRequestFeed,
    Store: CheckpointStore,
{
    /// Creates a pipeline over the given feed and checkpoint store.
    #[must_use]
    pub const fn new(feed: &'a Feed, checkpoint: &'a Store, settings: IngestSettings) -> Self {
        Self {
            feed,
            checkpoint,
            settings,
        }
    }

    /// Runs passes until one completes, retrying transient failures.
    ///
    /// The process may be killed at any point; checkpoints already advanced
    /// are durable, so the next invocation resumes after the last processed
    /// item. A crash after a row append but before the checkpoint advance
    /// duplicates that row on resume; this is a tolerated risk, absorbed by
    /// the downstream merge-date dedup.
    ///
    /// # Errors
    ///
    /// Returns the first non-transient error, or the last transient error
    /// once the retry policy is exhausted.
    pub async fn run(&self, locator: &RepositoryLocator) -> Result<PassSummary, IngestError> {
        let mut attempts: u32 = 0;
        loop {
            match self.pass(locator).await {
                Ok(summary) => return Ok(summary),
                Err(error) if error.is_transient() => {
                    attempts += 1;
                    if !self.settings.retry.allows(attempts) {
                        warn!(attempts, "retry budget exhausted; giving up");
                        return Err(error);
                    }
                    warn!(
                        attempts,
                        backoff_secs = self.settings.retry.backoff().as_secs(),
                        "transient failure, restarting pass after back-off: {error}"
                    );
                    tokio::time::sleep(self.settings.retry.backoff()).await;
                }
                Err(error) => return Err(error),
            }
        }
    }

    async fn pass(&self, locator: &RepositoryLocator) -> Result<PassSummary, IngestError> {
        let resume_id = self.checkpoint.read()?;

        let collector = ClosedPullRequestCollector::new(self.feed, self.settings.per_page);
        let pulls = collector
            .collect(locator, &self.settings.base_branches)
            .await?;

        let resume_index = resume_index(&pulls, resume_id);
        let mut writer = MetricTableWriter::open(&self.settings.table_path)?;
        let extractor = MetricExtractor::new(self.feed);

        let mut summary = PassSummary {
            collected: pulls.len(),
            resume_index,
            ..PassSummary::default()
        };

        for pull_request in pulls.get(resume_index..).unwrap_or_default() {
            if pull_request.is_merged() {
                match extractor.extract(locator, pull_request).await? {
                    Some(row) => {
                        writer.append(&row)?;
                        summary.rows_written += 1;
                    }
                    None => summary.skipped += 1,
                }
                // Only merged items move the cursor; closed-but-unmerged
                // pull requests are re-examined on the next run.
                self.checkpoint.write(pull_request.id)?;
            }
            summary.processed += 1;
        }

        info!(
            collected = summary.collected,
            processed = summary.processed,
            rows_written = summary.rows_written,
            "ingestion pass complete"
        );
        Ok(summary)
    }
}

/// Locates the resume offset: the position after the checkpointed item in
/// the freshly collected set, or the start when no checkpoint exists.
///
/// A checkpointed identifier missing from the fresh collection (remote data
/// changed under us) falls back to the start; items before the vanished one
/// are then reprocessed. Logged loudly because silent reprocessing or
/// skipping is the risk here.
fn resume_index(pulls: &[PullRequestRecord], resume_id: Option<u64>) -> usize {
    let Some(id) = resume_id else {
        return 0;
    };

    pulls
        .iter()
        .position(|pull_request| pull_request.id == id)
        .map_or_else(
            || {
                warn!(
                    checkpoint = id,
                    "checkpointed pull request not in fresh collection; reprocessing from start"
                );
                0
            },
            |index| index + 1,
        )
}

#[cfg(test)]
mod tests {
    use camino::Utf8PathBuf;
    use mockall::predicate::{always, eq};

    use super::{IngestSettings, IngestionPipeline, resume_index};
    use crate::github::error::IngestError;
    use crate::github::feed::{MockPullRequestFeed, PullRequestPage};
    use crate::github::locator::RepositoryLocator;
    use crate::github::models::CommitStats;
    use crate::github::models::test_support::{
        commit_at, merged_pull_request, unmerged_pull_request,
    };
    use crate::ingest::retry::RetryPolicy;
    use crate::persistence::checkpoint::{CheckpointStore, FileCheckpointStore};

    struct Harness {
        _dir: tempfile::TempDir,
        table_path: Utf8PathBuf,
        checkpoint: FileCheckpointStore,
    }

    impl Harness {
        fn new() -> Self {
            let dir = tempfile::tempdir().expect("tempdir should be created");
            let table_path = Utf8PathBuf::from_path_buf(dir.path().join("pr_metrics.csv"))
                .expect("temp path should be UTF-8");
            let checkpoint_path = Utf8PathBuf::from_path_buf(dir.path().join("checkpoint.txt"))
                .expect("temp path should be UTF-8");
            Self {
                _dir: dir,
                table_path,
                checkpoint: FileCheckpointStore::new(checkpoint_path),
            }
        }

        fn settings(&self) -> IngestSettings {
            IngestSettings {
                table_path: self.table_path.clone(),
                retry: RetryPolicy::new(std::time::Duration::ZERO, Some(3)),
                ..IngestSettings::default()
            }
        }

        fn table_content(&self) -> String {
            std::fs::read_to_string(&self.table_path).expect("table should exist")
        }
    }

    fn locator() -> RepositoryLocator {
        RepositoryLocator::from_owner_repo("octo", "radar").expect("locator should build")
    }

    fn empty_branch(feed: &mut MockPullRequestFeed, branch: &'static str) {
        feed.expect_closed_pull_requests()
            .with(always(), eq(branch), eq(1), eq(100))
            .returning(|_, _, _, _| {
                Ok(PullRequestPage {
                    items: vec![],
                    has_next: false,
                })
            });
    }

    #[tokio::test]
    async fn fresh_run_writes_header_row_and_checkpoint() {
        let harness = Harness::new();
        let mut feed = MockPullRequestFeed::new();
        feed.expect_closed_pull_requests()
            .with(always(), eq("main"), eq(1), eq(100))
            .returning(|_, _, _, _| {
                Ok(PullRequestPage {
                    items: vec![merged_pull_request(1)],
                    has_next: false,
                })
            });
        empty_branch(&mut feed, "master");
        feed.expect_pull_request_commits()
            .with(always(), eq(1))
            .returning(|_, _| Ok(vec![commit_at("aaa", 0), commit_at("bbb", 6)]));
        feed.expect_commit_stats()
            .with(always(), eq("aaa"))
            .returning(|_, _| {
                Ok(CommitStats {
                    additions: 10,
                    deletions: 2,
                })
            });
        feed.expect_commit_stats()
            .with(always(), eq("bbb"))
            .returning(|_, _| {
                Ok(CommitStats {
                    additions: 5,
                    deletions: 1,
                })
            });

        let pipeline = IngestionPipeline::new(&feed, &harness.checkpoint, harness.settings());
        let summary = pipeline
            .run(&locator())
            .await
            .expect("run should complete");

        assert_eq!(summary.rows_written, 1);
        assert_eq!(summary.processed, 1);

        let content = harness.table_content();
        let mut lines = content.lines();
        assert_eq!(
            lines.next(),
            Some(
                "Merge Date,Time to Integration (days),Number of Commits,\
                 Total Additions,Total Deletions,Total Lines Changed"
            )
        );
        assert_eq!(lines.next(), Some("2025-03-03 00:00:00,2.0,2,15,3,18"));

        assert_eq!(
            harness.checkpoint.read().expect("checkpoint should read"),
            Some(1)
        );
    }

    #[tokio::test]
    async fn rerun_with_no_new_data_appends_nothing() {
        let harness = Harness::new();
        let mut feed = MockPullRequestFeed::new();
        feed.expect_closed_pull_requests()
            .with(always(), eq("main"), eq(1), eq(100))
            .times(2)
            .returning(|_, _, _, _| {
                Ok(PullRequestPage {
                    items: vec![merged_pull_request(1)],
                    has_next: false,
                })
            });
        feed.expect_closed_pull_requests()
            .with(always(), eq("master"), eq(1), eq(100))
            .times(2)
            .returning(|_, _, _, _| {
                Ok(PullRequestPage {
                    items: vec![],
                    has_next: false,
                })
            });
        feed.expect_pull_request_commits()
            .times(1)
            .returning(|_, _| Ok(vec![commit_at("aaa", 0)]));
        feed.expect_commit_stats()
            .times(1)
            .returning(|_, _| Ok(CommitStats::default()));

        let pipeline = IngestionPipeline::new(&feed, &harness.checkpoint, harness.settings());
        let first = pipeline
            .run(&locator())
            .await
            .expect("first run should complete");
        assert_eq!(first.rows_written, 1);
        let rows_after_first = harness.table_content().lines().count();

        let second = pipeline
            .run(&locator())
            .await
            .expect("second run should complete");
        assert_eq!(second.rows_written, 0, "idempotent resume");
        assert_eq!(second.processed, 0);
        assert_eq!(harness.table_content().lines().count(), rows_after_first);
    }

    #[tokio::test]
    async fn zero_commit_pull_request_advances_checkpoint_without_a_row() {
        let harness = Harness::new();
        let mut feed = MockPullRequestFeed::new();
        feed.expect_closed_pull_requests()
            .with(always(), eq("main"), eq(1), eq(100))
            .returning(|_, _, _, _| {
                Ok(PullRequestPage {
                    items: vec![merged_pull_request(5)],
                    has_next: false,
                })
            });
        empty_branch(&mut feed, "master");
        feed.expect_pull_request_commits()
            .returning(|_, _| Ok(vec![]));

        let pipeline = IngestionPipeline::new(&feed, &harness.checkpoint, harness.settings());
        let summary = pipeline
            .run(&locator())
            .await
            .expect("run should complete");

        assert_eq!(summary.rows_written, 0);
        assert_eq!(summary.skipped, 1);
        assert_eq!(
            harness.checkpoint.read().expect("checkpoint should read"),
            Some(5)
        );
        assert!(
            !harness.table_path.as_std_path().exists(),
            "no row means the table is never created"
        );
    }

    #[tokio::test]
    async fn unmerged_pull_request_is_iterated_without_moving_the_cursor() {
        let harness = Harness::new();
        let mut feed = MockPullRequestFeed::new();
        feed.expect_closed_pull_requests()
            .with(always(), eq("main"), eq(1), eq(100))
            .returning(|_, _, _, _| {
                Ok(PullRequestPage {
                    items: vec![unmerged_pull_request(9)],
                    has_next: false,
                })
            });
        empty_branch(&mut feed, "master");
        feed.expect_pull_request_commits().times(0);

        let pipeline = IngestionPipeline::new(&feed, &harness.checkpoint, harness.settings());
        let summary = pipeline
            .run(&locator())
            .await
            .expect("run should complete");

        assert_eq!(summary.processed, 1);
        assert_eq!(summary.rows_written, 0);
        assert_eq!(
            harness.checkpoint.read().expect("checkpoint should read"),
            None,
            "closed-but-unmerged pull requests never advance the checkpoint"
        );
    }

    #[tokio::test]
    async fn checkpoint_stays_on_the_last_merged_item_past_unmerged_ones() {
        let harness = Harness::new();
        let mut feed = MockPullRequestFeed::new();
        feed.expect_closed_pull_requests()
            .with(always(), eq("main"), eq(1), eq(100))
            .returning(|_, _, _, _| {
                Ok(PullRequestPage {
                    items: vec![merged_pull_request(1), unmerged_pull_request(9)],
                    has_next: false,
                })
            });
        empty_branch(&mut feed, "master");
        feed.expect_pull_request_commits()
            .with(always(), eq(1))
            .returning(|_, _| Ok(vec![commit_at("aaa", 0)]));
        feed.expect_commit_stats()
            .returning(|_, _| Ok(CommitStats::default()));

        let pipeline = IngestionPipeline::new(&feed, &harness.checkpoint, harness.settings());
        let summary = pipeline
            .run(&locator())
            .await
            .expect("run should complete");

        assert_eq!(summary.processed, 2);
        assert_eq!(summary.rows_written, 1);
        assert_eq!(
            harness.checkpoint.read().expect("checkpoint should read"),
            Some(1),
            "the unmerged trailing item must not become the cursor"
        );
    }

    #[tokio::test]
    async fn transient_failure_restarts_after_the_last_checkpoint() {
        let harness = Harness::new();
        let mut feed = MockPullRequestFeed::new();
        feed.expect_closed_pull_requests()
            .with(always(), eq("main"), eq(1), eq(100))
            .times(2)
            .returning(|_, _, _, _| {
                Ok(PullRequestPage {
                    items: vec![merged_pull_request(1), merged_pull_request(2)],
                    has_next: false,
                })
            });
        feed.expect_closed_pull_requests()
            .with(always(), eq("master"), eq(1), eq(100))
            .times(2)
            .returning(|_, _, _, _| {
                Ok(PullRequestPage {
                    items: vec![],
                    has_next: false,
                })
            });
        // PR 1 succeeds exactly once: the restarted pass must not revisit it.
        feed.expect_pull_request_commits()
            .with(always(), eq(1))
            .times(1)
            .returning(|_, _| Ok(vec![commit_at("aaa", 0)]));
        // PR 2 fails the first pass, succeeds on the retry.
        let calls = std::sync::atomic::AtomicUsize::new(0);
        feed.expect_pull_request_commits()
            .with(always(), eq(2))
            .times(2)
            .returning(move |_, _| {
                if calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst) == 0 {
                    Err(IngestError::Network {
                        message: "connection reset".to_owned(),
                    })
                } else {
                    Ok(vec![commit_at("bbb", 0)])
                }
            });
        feed.expect_commit_stats()
            .returning(|_, _| Ok(CommitStats::default()));

        let pipeline = IngestionPipeline::new(&feed, &harness.checkpoint, harness.settings());
        let summary = pipeline
            .run(&locator())
            .await
            .expect("run should complete after one retry");

        assert_eq!(summary.resume_index, 1, "restart resumed after item 1");
        assert_eq!(
            harness.checkpoint.read().expect("checkpoint should read"),
            Some(2)
        );
        let rows: Vec<String> = harness
            .table_content()
            .lines()
            .skip(1)
            .map(str::to_owned)
            .collect();
        assert_eq!(rows.len(), 2, "one row per pull request, no duplicates");
    }

    #[tokio::test]
    async fn duplicate_across_filters_is_processed_twice() {
        let harness = Harness::new();
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
        feed.expect_pull_request_commits()
            .with(always(), eq(7))
            .times(2)
            .returning(|_, _| Ok(vec![commit_at("aaa", 0)]));
        feed.expect_commit_stats()
            .returning(|_, _| Ok(CommitStats::default()));

        let pipeline = IngestionPipeline::new(&feed, &harness.checkpoint, harness.settings());
        let summary = pipeline
            .run(&locator())
            .await
            .expect("run should complete");

        assert_eq!(summary.processed, 2);
        assert_eq!(summary.rows_written, 2, "both occurrences produce rows");
        assert_eq!(
            harness.checkpoint.read().expect("checkpoint should read"),
            Some(7)
        );
    }

    #[tokio::test]
    async fn retry_budget_exhaustion_surfaces_the_transient_error() {
        let harness = Harness::new();
        let mut feed = MockPullRequestFeed::new();
        feed.expect_closed_pull_requests()
            .times(3)
            .returning(|_, _, _, _| {
                Err(IngestError::Network {
                    message: "connection reset".to_owned(),
                })
            });

        let settings = IngestSettings {
            retry: RetryPolicy::new(std::time::Duration::ZERO, Some(2)),
            ..harness.settings()
        };
        let pipeline = IngestionPipeline::new(&feed, &harness.checkpoint, settings);
        let error = pipeline
            .run(&locator())
            .await
            .expect_err("run should give up");
        assert!(error.is_transient());
    }

    #[test]
    fn missing_resume_id_falls_back_to_the_start() {
        let pulls = vec![merged_pull_request(1), merged_pull_request(2)];
        assert_eq!(resume_index(&pulls, None), 0);
        assert_eq!(resume_index(&pulls, Some(1)), 1);
        assert_eq!(resume_index(&pulls, Some(2)), 2);
        assert_eq!(resume_index(&pulls, Some(404)), 0, "vanished checkpoint");
    }
}
