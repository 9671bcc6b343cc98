//! Error mapping helpers for the Octocrab feed implementation.

use std::error::Error as StdError;

use http::StatusCode;

use crate::github::error::IngestError;

/// Checks if a GitHub error status indicates an authentication failure.
pub(super) const fn is_auth_failure(status: StatusCode) -> bool {
    matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
}

/// Checks if an octocrab error represents a network/transport issue.
pub(super) const fn is_network_error(error: &octocrab::Error) -> bool {
    matches!(
        error,
        octocrab::Error::Http { .. }
            | octocrab::Error::Hyper { .. }
            | octocrab::Error::Service { .. }
    )
}

/// Checks whether the GitHub error represents a rate limit rejection based on
/// the HTTP status and message / documentation URL content.
pub(super) fn is_rate_limit_error(source: &octocrab::GitHubError) -> bool {
    let is_rate_limit_status = matches!(
        source.status_code,
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS
    );

    let message_indicates_rate_limit = source.message.to_lowercase().contains("rate limit")
        || source
            .documentation_url
            .as_deref()
            .is_some_and(|url| url.contains("rate-limit"));

    is_rate_limit_status && message_indicates_rate_limit
}

/// Checks whether a transport error chain looks like a timeout.
///
/// Octocrab does not classify timeouts; the underlying hyper/client errors
/// report them in their messages, so the chain is inspected textually.
pub(super) fn is_timeout_error(error: &octocrab::Error) -> bool {
    is_network_error(error) && chain_mentions_timeout(error)
}

pub(super) fn chain_mentions_timeout(error: &(dyn StdError + 'static)) -> bool {
    let mut current: Option<&(dyn StdError + 'static)> = Some(error);
    while let Some(err) = current {
        let text = err.to_string().to_lowercase();
        if text.contains("timed out") || text.contains("timeout") {
            return true;
        }
        current = err.source();
    }
    false
}

pub(super) fn map_octocrab_error(operation: &str, error: &octocrab::Error) -> IngestError {
    if let octocrab::Error::GitHub { source, .. } = error {
        return if is_auth_failure(source.status_code) {
            IngestError::Authentication {
                message: format!(
                    "{operation} failed: GitHub returned {status} {message}",
                    status = source.status_code,
                    message = source.message
                ),
            }
        } else {
            IngestError::Api {
                message: format!(
                    "{operation} failed with status {status}: {message}",
                    status = source.status_code,
                    message = source.message
                ),
            }
        };
    }

    if is_network_error(error) {
        return IngestError::Network {
            message: format!("{operation} failed: {error}"),
        };
    }

    IngestError::Api {
        message: format!("{operation} failed: {error}"),
    }
}
