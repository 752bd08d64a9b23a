//! Metadata store error types.

use thiserror::Error;

/// Metadata store operation errors.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for metadata operations.
pub type MetadataResult<T> = std::result::Result<T, MetadataError>;

/// Map a database unique-index violation to [`MetadataError::Constraint`].
///
/// The application-level existence checks are not atomic with the insert;
/// the database's unique index is the final backstop for concurrent writers
/// and must surface as a conflict, not an internal error.
pub(crate) fn constraint_violation(err: sqlx::Error, what: &str) -> MetadataError {
    match &err {
        sqlx::Error::Database(db_err)
            if db_err.message().contains("UNIQUE constraint")
                || db_err.message().contains("duplicate key") =>
        {
            MetadataError::Constraint(what.to_string())
        }
        _ => MetadataError::Database(err),
    }
}
