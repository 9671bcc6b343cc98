//! Append-only CSV table of per-pull-request integration metrics.
//!
//! The header is written exactly once over the table's lifetime: only when
//! the file did not exist at the moment the writer was opened. Appends are
//! flushed per row so a crash between items loses at most the in-flight row.

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::fs::OpenOptions;
use cap_std::fs_utf8::Dir;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use super::checkpoint::open_dir_creating;
use super::error::PersistenceError;

/// Timestamp format used for the merge date column.
///
/// The downstream consumer parses this format with no fallback; it must not
/// change.
pub const MERGE_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Name of the merge date column, the downstream dedup key.
pub const MERGE_DATE_COLUMN: &str = "Merge Date";

/// One persisted row: the derived metrics for a single merged pull request.
///
/// At most one row per distinct merge date is meaningful downstream; the
/// writer does not enforce that, the consumer dedups on the merge date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricRow {
    /// Merge timestamp, second precision.
    #[serde(rename = "Merge Date", serialize_with = "serialize_merge_date")]
    pub merge_date: DateTime<Utc>,
    /// Days between the first returned commit and the merge.
    #[serde(rename = "Time to Integration (days)")]
    pub time_to_integration_days: f64,
    /// Number of commits in the pull request.
    #[serde(rename = "Number of Commits")]
    pub commit_count: u64,
    /// Summed additions over commits whose statistics were fetched.
    #[serde(rename = "Total Additions")]
    pub total_additions: u64,
    /// Summed deletions over commits whose statistics were fetched.
    #[serde(rename = "Total Deletions")]
    pub total_deletions: u64,
    /// Additions plus deletions.
    #[serde(rename = "Total Lines Changed")]
    pub total_lines_changed: u64,
}

fn serialize_merge_date<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(&value.format(MERGE_DATE_FORMAT))
}

/// Incremental writer appending [`MetricRow`]s to a CSV table.
#[derive(Debug)]
pub struct MetricTableWriter {
    dir: Dir,
    file_name: String,
    path: Utf8PathBuf,
    pending_header: bool,
}

impl MetricTableWriter {
    /// Opens the table for appending, recording whether the file already
    /// existed so the header is emitted at most once per table lifetime.
    ///
    /// Parent directories are created when needed.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::TableOpen`] when the parent directory
    /// cannot be opened or the file's existence cannot be determined.
    pub fn open(path: &Utf8Path) -> Result<Self, PersistenceError> {
        let parent = path.parent().unwrap_or_else(|| Utf8Path::new("."));
        let file_name = path
            .file_name()
            .ok_or_else(|| PersistenceError::TableOpen {
                path: path.to_string(),
                message: "path has no file name".to_owned(),
            })?
            .to_owned();

        let dir = open_dir_creating(parent).map_err(|message| PersistenceError::TableOpen {
            path: path.to_string(),
            message,
        })?;

        let exists = match dir.metadata(&file_name) {
            Ok(_) => true,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => false,
            Err(error) => {
                return Err(PersistenceError::TableOpen {
                    path: path.to_string(),
                    message: error.to_string(),
                });
            }
        };

        Ok(Self {
            dir,
            file_name,
            path: path.to_owned(),
            pending_header: !exists,
        })
    }

    /// Returns the table path.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        self.path.as_path()
    }

    /// Appends one row, emitting the header first when this writer opened a
    /// table that did not yet exist and nothing has been appended since.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::TableAppend`] when the file cannot be
    /// opened for appending or the row cannot be written.
    pub fn append(&mut self, row: &MetricRow) -> Result<(), PersistenceError> {
        let file = self
            .dir
            .open_with(
                &self.file_name,
                OpenOptions::new().create(true).append(true),
            )
            .map_err(|error| PersistenceError::TableAppend {
                path: self.path.to_string(),
                message: error.to_string(),
            })?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(self.pending_header)
            .from_writer(file);
        writer
            .serialize(row)
            .and_then(|()| writer.flush().map_err(csv::Error::from))
            .map_err(|error| PersistenceError::TableAppend {
                path: self.path.to_string(),
                message: error.to_string(),
            })?;

        self.pending_header = false;
        Ok(())
    }
}
