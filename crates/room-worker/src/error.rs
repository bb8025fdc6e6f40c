//! Worker error types.

use room_gateway::GatewayError;
use roomlog_store::StoreError;
use roomlog_writer::WriteError;
use thiserror::Error;

/// Anything that ends a worker session.
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Gateway error
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Write path error
    #[error("Write error: {0}")]
    Write(#[from] WriteError),

    /// Store read error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl WorkerError {
    /// Errors that reconnecting cannot fix.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WorkerError::Gateway(GatewayError::RoomNotFound(_))
                | WorkerError::Write(WriteError::QueueClosed)
        )
    }
}

/// Result type alias using WorkerError.
pub type WorkerResult<T> = Result<T, WorkerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_errors() {
        assert!(WorkerError::from(GatewayError::RoomNotFound("x".into())).is_terminal());
        assert!(WorkerError::from(WriteError::QueueClosed).is_terminal());
        assert!(!WorkerError::from(GatewayError::Disconnected).is_terminal());
        assert!(!WorkerError::from(GatewayError::Timeout).is_terminal());
        assert!(!WorkerError::from(WriteError::QueueFull { capacity: 1 }).is_terminal());
    }
}
