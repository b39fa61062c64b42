//! Error types for the shared database layer

use sqlx::migrate::MigrateError;
use thiserror::Error;

/// Failures while configuring, reaching or migrating PostgreSQL
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// The pool could not open its connections
    #[error("Database connection error: {0}")]
    Connection(#[source] sqlx::Error),

    /// A pending migration failed to apply
    #[error("Database migration error: {0}")]
    Migration(#[from] MigrateError),

    /// Missing or inconsistent settings
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;
