//! Store error types.

use thiserror::Error;

/// Store error type.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Executor thread or read task unavailable
    #[error("Connection error: {0}")]
    Connection(String),

    /// Migration error
    #[error("Migration error: {0}")]
    Migration(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using StoreError.
pub type StoreResult<T> = Result<T, StoreError>;

/// Coarse classification of a store failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// A UNIQUE (or other) constraint rejected the write.
    ConstraintViolation,
    /// The database was busy or locked; the same write may succeed later.
    Transient,
    /// Anything else.
    Fatal,
}

impl StoreError {
    pub fn class(&self) -> ErrorClass {
        match self {
            StoreError::Sqlite(err) => match err.sqlite_error_code() {
                Some(rusqlite::ErrorCode::ConstraintViolation) => ErrorClass::ConstraintViolation,
                Some(rusqlite::ErrorCode::DatabaseBusy)
                | Some(rusqlite::ErrorCode::DatabaseLocked) => ErrorClass::Transient,
                _ => ErrorClass::Fatal,
            },
            _ => ErrorClass::Fatal,
        }
    }
}
