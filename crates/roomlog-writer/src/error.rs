//! Writer error types.

use roomlog_store::StoreError;
use thiserror::Error;

/// Failure decoding a write intent from its wire shape.
#[derive(Error, Debug)]
pub enum IntentError {
    /// Mode string is neither `execute` nor `executemany`
    #[error("Unknown execution mode: {0:?}")]
    UnknownMode(String),

    /// Values do not have the shape the mode requires
    #[error("Values do not match mode {mode}: {detail}")]
    ShapeMismatch { mode: &'static str, detail: String },

    /// Not a `[statement, values, mode]` array
    #[error("Malformed intent: {0}")]
    Malformed(String),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using IntentError.
pub type IntentResult<T> = Result<T, IntentError>;

/// Failure submitting or applying a write.
#[derive(Error, Debug)]
pub enum WriteError {
    /// Store rejected the write and it was not a duplicate
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Queue at capacity under the `reject` policy
    #[error("Write queue full (capacity {capacity})")]
    QueueFull { capacity: usize },

    /// Writer has shut down
    #[error("Write queue closed")]
    QueueClosed,

    /// Intent could not be decoded
    #[error("Invalid intent: {0}")]
    Intent(#[from] IntentError),
}

/// Result type alias using WriteError.
pub type WriteResult<T> = Result<T, WriteError>;
