use std::io;

use daytask_core::auth::AuthError;
use daytask_core::remote::RemoteError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] daytask_core::Error),
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),
    #[error("Remote service error: {0}")]
    Remote(#[from] RemoteError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("No content provided")]
    EmptyContent,
    #[error("Edited note content cannot be empty")]
    EmptyEditedContent,
    #[error("ID cannot be empty")]
    EmptyId,
    #[error("Nothing to change; pass at least one field")]
    NothingToEdit,
    #[error("No record found for id/prefix: {0}")]
    NotFound(String),
    #[error("{0}")]
    AmbiguousId(String),
    #[error("Invalid date/time '{0}'; use YYYY-MM-DD, \"YYYY-MM-DD HH:MM\" or RFC 3339")]
    InvalidDate(String),
    #[error("Invalid value for {key}: {message}")]
    InvalidSetting { key: String, message: String },
    #[error("Password required; pass --password or pipe it on stdin")]
    MissingPassword,
    #[error("Editor command failed: {0}")]
    EditorFailed(String),
}
