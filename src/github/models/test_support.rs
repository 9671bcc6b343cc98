//! Test helpers for constructing pull request and commit fixtures.
//!
//! These builders keep ingestion tests focused on the scenario under test
//! instead of repeating record construction.

use chrono::{DateTime, TimeZone, Utc};

use super::{CommitSummary, PullRequestRecord};

/// Returns a fixed, unambiguous timestamp offset by `hours` from a baseline.
///
/// # Panics
///
/// Never panics for the baseline used; the constructed timestamps are always
/// valid calendar instants.
#[must_use]
#[expect(
    clippy::expect_used,
    reason = "the fixture baseline is a valid calendar instant"
)]
pub fn hours_from_baseline(hours: i64) -> DateTime<Utc> {
    let baseline = Utc
        .with_ymd_and_hms(2025, 3, 1, 0, 0, 0)
        .single()
        .expect("baseline timestamp should be unambiguous");
    baseline + chrono::Duration::hours(hours)
}

/// Constructs a merged pull request record with the given id.
///
/// The merge timestamp is placed 48 hours after the baseline and the base
/// branch defaults to `main`.
#[must_use]
pub fn merged_pull_request(id: u64) -> PullRequestRecord {
    PullRequestRecord {
        id,
        number: id,
        merged_at: Some(hours_from_baseline(48)),
        base_branch: Some("main".to_owned()),
    }
}

/// Constructs a closed-but-unmerged pull request record.
#[must_use]
pub fn unmerged_pull_request(id: u64) -> PullRequestRecord {
    PullRequestRecord {
        id,
        number: id,
        merged_at: None,
        base_branch: Some("main".to_owned()),
    }
}

/// Constructs a commit summary authored the given hours after the baseline.
#[must_use]
pub fn commit_at(sha: &str, hours: i64) -> CommitSummary {
    CommitSummary {
        sha: sha.to_owned(),
        authored_at: Some(hours_from_baseline(hours)),
    }
}
