use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Malformed content in {identifier}: {reason}")]
    MalformedContent { identifier: String, reason: String },

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Post not found: {0}")]
    NotFound(String),

    #[error("Slug already in use: {0}")]
    SlugConflict(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("This content source is read-only")]
    ReadOnly,
}

impl RepoError {
    pub fn malformed(identifier: &str, reason: impl ToString) -> Self {
        RepoError::MalformedContent {
            identifier: identifier.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<sqlx::Error> for RepoError {
    fn from(value: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = value {
            if db_err.is_unique_violation() {
                return RepoError::SlugConflict(db_err.message().to_string());
            }
        }
        RepoError::Backend(value.to_string())
    }
}
