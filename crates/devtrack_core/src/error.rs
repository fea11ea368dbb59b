//! Error types for devtrack_core operations.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Phase of a snapshot cycle in which a git operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotPhase {
    /// Repository initialization or opening.
    Init,
    /// Copying the source folder over the mirror.
    Copy,
    /// Staging and committing the snapshot.
    Commit,
    /// Computing the diff between two revisions.
    Diff,
}

impl fmt::Display for SnapshotPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Init => "init",
            Self::Copy => "copy",
            Self::Commit => "commit",
            Self::Diff => "diff",
        };
        f.write_str(s)
    }
}

/// Core error type for devtrack operations.
#[derive(Error, Debug)]
pub enum TrackerError {
    /// A project with the given name already exists.
    #[error("project already exists: {0}")]
    ProjectExists(String),

    /// Another project already tracks the given folder.
    #[error("folder already tracked by project {project}: {}", path.display())]
    FolderInUse {
        /// The contested folder.
        path: PathBuf,
        /// Name of the project that owns it.
        project: String,
    },

    /// No project with the given name exists.
    #[error("project not found: {0}")]
    ProjectNotFound(String),

    /// Project name failed validation.
    #[error("invalid project name: {0}")]
    InvalidProjectName(String),

    /// The tracked source folder does not exist.
    #[error("source folder does not exist: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// The tracked source path is not a directory.
    #[error("source path is not a directory: {}", .0.display())]
    SourceNotDirectory(PathBuf),

    /// The source folder contained no files to snapshot.
    #[error("no files in source folder to track: {}", .0.display())]
    EmptySource(PathBuf),

    /// An underlying git operation failed during a snapshot cycle.
    #[error("snapshot operation failed during {phase}: {message}")]
    Snapshot {
        /// Phase in which the failure occurred.
        phase: SnapshotPhase,
        /// Message from the underlying git operation.
        message: String,
    },

    /// A diff segment could not be parsed into the change model.
    #[error("failed to parse diff: {0}")]
    DiffParseFailed(String),

    /// Storage read/write/index failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// Stored record or project data could not be deserialized.
    #[error("corrupted record data: {0}")]
    CorruptedRecord(String),

    /// Configuration error (loading, parsing, invalid values).
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TrackerError {
    /// Wraps a git error with the snapshot phase in which it occurred.
    pub fn snapshot(phase: SnapshotPhase, err: git2::Error) -> Self {
        Self::Snapshot {
            phase,
            message: err.message().to_string(),
        }
    }
}

impl From<redb::DatabaseError> for TrackerError {
    fn from(e: redb::DatabaseError) -> Self {
        Self::Storage(e.to_string())
    }
}

impl From<redb::TransactionError> for TrackerError {
    fn from(e: redb::TransactionError) -> Self {
        Self::Storage(e.to_string())
    }
}

impl From<redb::TableError> for TrackerError {
    fn from(e: redb::TableError) -> Self {
        Self::Storage(e.to_string())
    }
}

impl From<redb::StorageError> for TrackerError {
    fn from(e: redb::StorageError) -> Self {
        Self::Storage(e.to_string())
    }
}

impl From<redb::CommitError> for TrackerError {
    fn from(e: redb::CommitError) -> Self {
        Self::Storage(e.to_string())
    }
}

/// Convenience Result type for devtrack_core operations.
pub type Result<T> = std::result::Result<T, TrackerError>;
