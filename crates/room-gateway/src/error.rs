//! Gateway error types.

use thiserror::Error;

/// Gateway error type.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// WebSocket error
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// The server has no such room
    #[error("Room not found: {0}")]
    RoomNotFound(String),

    /// Server closed the session or the stream ended
    #[error("Disconnected from room")]
    Disconnected,

    /// Nothing received within the receive timeout
    #[error("Receive timed out")]
    Timeout,

    /// Operation needs an open session
    #[error("Not connected")]
    NotConnected,

    /// Server answered a request with an error
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using GatewayError.
pub type GatewayResult<T> = Result<T, GatewayError>;
