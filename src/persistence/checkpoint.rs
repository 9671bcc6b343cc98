//! Durable single-value cursor marking the last processed pull request.
//!
//! The checkpoint is a plain-text integer overwritten after every processed
//! merged pull request. Absence means a fresh ingestion; the file is never
//! deleted by the
//! tool, so restarting from scratch is a manual operation.

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;

use super::error::PersistenceError;

/// Durable store for the last fully-processed pull request identifier.
///
/// Injected into the orchestrator so tests can substitute a mock and so the
/// flat-file backing can be replaced without touching the pass loop.
#[cfg_attr(test, mockall::automock)]
pub trait CheckpointStore: Send + Sync {
    /// Reads the stored identifier.
    ///
    /// An absent checkpoint is `Ok(None)`, never an error.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::CheckpointRead`] when the file cannot be
    /// read for any reason other than absence, and
    /// [`PersistenceError::CheckpointCorrupt`] when its content is not a
    /// single integer.
    fn read(&self) -> Result<Option<u64>, PersistenceError>;

    /// Overwrites the stored identifier.
    ///
    /// A crash mid-write may lose this one advance; the pipeline tolerates
    /// reprocessing the affected item on resume.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::CheckpointWrite`] when the file cannot be
    /// written.
    fn write(&self, id: u64) -> Result<(), PersistenceError>;
}

/// Flat-file checkpoint store.
#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    path: Utf8PathBuf,
}

impl FileCheckpointStore {
    /// Creates a store backed by the given file path.
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the checkpoint file path.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        self.path.as_path()
    }

    fn split(&self) -> Result<(&Utf8Path, &str), PersistenceError> {
        let parent = self.path.parent().unwrap_or_else(|| Utf8Path::new("."));
        let file_name = self
            .path
            .file_name()
            .ok_or_else(|| PersistenceError::CheckpointRead {
                path: self.path.to_string(),
                message: "path has no file name".to_owned(),
            })?;
        Ok((parent, file_name))
    }
}

impl CheckpointStore for FileCheckpointStore {
    fn read(&self) -> Result<Option<u64>, PersistenceError> {
        let (parent, file_name) = self.split()?;
        let Some(dir) = open_dir_if_exists(parent).map_err(|message| {
            PersistenceError::CheckpointRead {
                path: self.path.to_string(),
                message,
            }
        })?
        else {
            return Ok(None);
        };

        let content = match dir.read_to_string(file_name) {
            Ok(content) => content,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(error) => {
                return Err(PersistenceError::CheckpointRead {
                    path: self.path.to_string(),
                    message: error.to_string(),
                });
            }
        };

        content
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|error| PersistenceError::CheckpointCorrupt {
                path: self.path.to_string(),
                message: error.to_string(),
            })
    }

    fn write(&self, id: u64) -> Result<(), PersistenceError> {
        let (parent, file_name) =
            self.split()
                .map_err(|error| PersistenceError::CheckpointWrite {
                    path: self.path.to_string(),
                    message: error.to_string(),
                })?;

        let dir = open_dir_creating(parent).map_err(|message| {
            PersistenceError::CheckpointWrite {
                path: self.path.to_string(),
                message,
            }
        })?;

        dir.write(file_name, id.to_string())
            .map_err(|error| PersistenceError::CheckpointWrite {
                path: self.path.to_string(),
                message: error.to_string(),
            })
    }
}

/// Opens a directory, returning `None` when it does not exist.
pub(super) fn open_dir_if_exists(path: &Utf8Path) -> Result<Option<Dir>, String> {
    match Dir::open_ambient_dir(path, ambient_authority()) {
        Ok(dir) => Ok(Some(dir)),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(error) => Err(error.to_string()),
    }
}

/// Opens a directory, creating it (and its parents) when missing.
pub(super) fn open_dir_creating(path: &Utf8Path) -> Result<Dir, String> {
    if let Ok(dir) = Dir::open_ambient_dir(path, ambient_authority()) {
        return Ok(dir);
    }
    std::fs::create_dir_all(path).map_err(|error| error.to_string())?;
    Dir::open_ambient_dir(path, ambient_authority()).map_err(|error| error.to_string())
}
