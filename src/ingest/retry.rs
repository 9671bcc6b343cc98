//! Retry policy for whole-pass restarts after transient remote failures.

use std::time::Duration;

/// Back-off applied between passes when no override is configured.
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(60 * 60);

/// Governs how the orchestrator restarts a pass after a transient failure.
///
/// The default is the historical behaviour: unbounded retries with a one
/// hour back-off. Tests inject a zero back-off and a bound so fault
/// injection needs no real waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    backoff: Duration,
    max_attempts: Option<u32>,
}

impl RetryPolicy {
    /// Creates a policy with the given back-off and optional retry bound.
    ///
    /// `max_attempts` counts restarts, not passes: `Some(0)` never retries,
    /// `None` retries indefinitely.
    #[must_use]
    pub const fn new(backoff: Duration, max_attempts: Option<u32>) -> Self {
        Self {
            backoff,
            max_attempts,
        }
    }

    /// Creates an unbounded policy with the given back-off.
    #[must_use]
    pub const fn indefinite(backoff: Duration) -> Self {
        Self::new(backoff, None)
    }

    /// Returns the delay applied before each restart.
    #[must_use]
    pub const fn backoff(&self) -> Duration {
        self.backoff
    }

    /// Returns true when another restart is allowed after `attempts`
    /// failures so far.
    #[must_use]
    pub fn allows(&self, attempts: u32) -> bool {
        self.max_attempts.is_none_or(|max| attempts <= max)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::indefinite(DEFAULT_BACKOFF)
    }
}
