//! Error types for control operations

use thiserror::Error;

/// Errors that can occur during control operations
#[derive(Debug, Error)]
pub enum ControlError {
    /// I/O error communicating with the management agent
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Protocol deserialization error
    #[error("Protocol error: {0}")]
    ProtocolDeserialization(#[from] bincode::error::DecodeError),

    /// Protocol serialization error
    #[error("Protocol error: {0}")]
    ProtocolSerialization(#[from] bincode::error::EncodeError),

    /// Server returned an error
    #[error("Server error: {0}")]
    ServerError(String),

    /// Connection closed unexpectedly
    #[error("Connection closed")]
    ConnectionClosed,

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// Peer speaks a different protocol version
    #[error("Incompatible protocol version: server={server}, client={client}")]
    VersionMismatch { server: u32, client: u32 },

    /// A frame exceeded the permitted size
    #[error("Frame too large: {size} bytes (max {max})")]
    FrameTooLarge { size: u32, max: u32 },

    /// Server answered with data of the wrong shape for the request
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

/// Result type for control operations
pub type Result<T> = std::result::Result<T, ControlError>;
