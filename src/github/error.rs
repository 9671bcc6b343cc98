//! Error types exposed by the GitHub ingestion layer.

use thiserror::Error;

use super::rate_limit::RateLimitInfo;

/// Errors surfaced while parsing input or communicating with GitHub.
///
/// The orchestrator classifies these into the taxonomy the pipeline acts on:
/// [`IngestError::is_transient`] marks failures that abort and restart the
/// whole pass after a back-off, while [`IngestError::StatsTimeout`] is a
/// partial data gap the extractor absorbs without escalating.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IngestError {
    /// The authentication token was missing.
    #[error("personal access token is required")]
    MissingToken,

    /// No repository was configured for ingestion.
    #[error("repository is required (use --repo or MERGERADAR_REPO)")]
    MissingRepository,

    /// The provided repository reference could not be parsed.
    #[error("repository URL is invalid: {0}")]
    InvalidUrl(String),

    /// The repository path is incomplete.
    #[error("repository must match owner/repo")]
    MissingPathSegments,

    /// Configuration could not be loaded.
    #[error("configuration error: {message}")]
    Configuration {
        /// Details about the configuration failure.
        message: String,
    },

    /// The authentication token was rejected by GitHub.
    #[error("GitHub rejected the token: {message}")]
    Authentication {
        /// GitHub error message returned with the 401/403 response.
        message: String,
    },

    /// GitHub returned a non-authentication API error.
    #[error("GitHub API error: {message}")]
    Api {
        /// Response body from GitHub describing the failure.
        message: String,
    },

    /// Networking failed while calling GitHub.
    #[error("network error talking to GitHub: {message}")]
    Network {
        /// Transport-level error detail.
        message: String,
    },

    /// Rate limit exceeded - the API returned 403 with rate limit message.
    #[error("GitHub API rate limit exceeded: {message}")]
    RateLimitExceeded {
        /// Rate limit info if available from response headers.
        rate_limit: Option<RateLimitInfo>,
        /// Error message from GitHub.
        message: String,
    },

    /// A single commit's statistics fetch timed out.
    ///
    /// The extractor skips the commit's contribution and keeps going; this
    /// variant never restarts a pass.
    #[error("statistics fetch for commit {sha} timed out: {message}")]
    StatsTimeout {
        /// SHA of the commit whose statistics were unavailable.
        sha: String,
        /// Transport-level error detail.
        message: String,
    },

    /// Local I/O operation failed.
    #[error("I/O error: {message}")]
    Io {
        /// Error detail from the underlying I/O operation.
        message: String,
    },

    /// The output table does not exist yet.
    #[error("metric table not found at '{path}'; run an ingestion pass first")]
    TableMissing {
        /// Path that was checked for the table.
        path: String,
    },

    /// The output table exists but cannot be interpreted.
    #[error("metric table is malformed: {message}")]
    TableMalformed {
        /// Description of the malformation.
        message: String,
    },
}

impl IngestError {
    /// Returns true when the failure warrants aborting and restarting the
    /// whole ingestion pass after a back-off.
    ///
    /// Every remote failure class is treated as transient, including
    /// authentication rejections: the pipeline is an offline batch tool and
    /// retries service-level errors indiscriminately. Local I/O and
    /// configuration failures are never transient.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Authentication { .. }
                | Self::Api { .. }
                | Self::Network { .. }
                | Self::RateLimitExceeded { .. }
        )
    }

    /// Returns true for a partial data gap: a failure absorbed locally by
    /// the extractor rather than escalated to the pass level.
    #[must_use]
    pub const fn is_partial_gap(&self) -> bool {
        matches!(self, Self::StatsTimeout { .. })
    }
}
