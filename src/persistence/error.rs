//! Error types for local durable state.

use thiserror::Error;

use crate::github::IngestError;

/// Errors returned while reading or writing the checkpoint and metric table.
///
/// These are local I/O failures (disk full, permission denied, corrupt
/// content) and are never retried: the pipeline propagates them as hard
/// failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PersistenceError {
    /// Reading the checkpoint file failed for a reason other than absence.
    #[error("failed to read checkpoint '{path}': {message}")]
    CheckpointRead {
        /// Checkpoint file path.
        path: String,
        /// Error detail from the underlying read.
        message: String,
    },

    /// The checkpoint file exists but does not hold a single integer.
    #[error("checkpoint '{path}' is corrupt: {message}")]
    CheckpointCorrupt {
        /// Checkpoint file path.
        path: String,
        /// Description of the unparseable content.
        message: String,
    },

    /// Writing the checkpoint file failed.
    #[error("failed to write checkpoint '{path}': {message}")]
    CheckpointWrite {
        /// Checkpoint file path.
        path: String,
        /// Error detail from the underlying write.
        message: String,
    },

    /// Opening or inspecting the metric table failed.
    #[error("failed to open metric table '{path}': {message}")]
    TableOpen {
        /// Metric table path.
        path: String,
        /// Error detail from the underlying operation.
        message: String,
    },

    /// Appending a row to the metric table failed.
    #[error("failed to append to metric table '{path}': {message}")]
    TableAppend {
        /// Metric table path.
        path: String,
        /// Error detail from the underlying write.
        message: String,
    },
}

impl From<PersistenceError> for IngestError {
    fn from(error: PersistenceError) -> Self {
        Self::Io {
            message: error.to_string(),
        }
    }
}
