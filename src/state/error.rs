//! Error types for the state store.

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

/// Errors that make the persisted state untrustworthy. Any of these halts
/// the run.
#[derive(Error, Debug)]
pub enum StateError {
    /// The state document exists but could not be read.
    #[error("Failed to read state document at {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The state document exists but is not valid.
    #[error("State document at {path} is malformed: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Writing or replacing the state document failed. The previous
    /// document is left in place.
    #[error("Failed to write state document at {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Serializing the in-memory document failed.
    #[error("Failed to encode state document: {0}")]
    Encode(#[from] serde_json::Error),

    /// The lock file could not be created.
    #[error("Failed to create lock file {path}: {source}")]
    LockFile {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Another process holds the state lock.
    #[error("Another mei-rs instance is using this state document (lock: {path})")]
    Locked { path: PathBuf },

    /// The global marker may never be moved past today.
    #[error("Refusing to mark {date} as processed: it is after today ({today})")]
    FutureDate { date: NaiveDate, today: NaiveDate },

    /// Failed to spawn a blocking task.
    #[error("Failed to spawn blocking task: {0}")]
    Spawn(#[from] tokio::task::JoinError),
}

/// A series or series/format directory could not be created.
#[derive(Error, Debug)]
#[error("Failed to create directory {path}: {source}")]
pub struct FilesystemError {
    pub path: PathBuf,
    pub source: std::io::Error,
}
