//! Error types for daytask-core

use thiserror::Error;

use crate::auth::AuthError;
use crate::remote::RemoteError;

/// Result type alias using daytask-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Which half of a merge failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStage {
    /// Fetching the owner's records from the remote service
    RemoteRead,
    /// Pushing the merged set to the remote service
    RemoteWrite,
}

impl std::fmt::Display for MergeStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RemoteRead => f.write_str("remote read"),
            Self::RemoteWrite => f.write_str("remote write"),
        }
    }
}

/// Errors that can occur in daytask-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Remote call failed while the actor was online
    #[error("Remote service error: {0}")]
    Remote(#[from] RemoteError),

    /// Pending log replay stopped at `position` (1-based) of `total`
    #[error("Sync stopped at entry {position} of {total}: {source}")]
    SyncReplay {
        position: usize,
        total: usize,
        #[source]
        source: RemoteError,
    },

    /// Merge failed; safe to run again
    #[error("Merge failed during {stage}: {source}")]
    Merge {
        stage: MergeStage,
        #[source]
        source: RemoteError,
    },

    /// A sync or merge for the same entity kind is still in flight
    #[error("{0} is already running")]
    AlreadyRunning(String),

    /// Operation requires an authenticated identity
    #[error("No authenticated identity")]
    NotAuthenticated,

    /// Authentication/session error
    #[error(transparent)]
    Auth(#[from] AuthError),
}
