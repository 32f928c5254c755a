//! Error types for transport operations.

use thiserror::Error;

/// Error type for transport operations.
#[derive(Debug, Error)]
pub enum TransportError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Connection attempt timed out.
    #[error("connection timeout")]
    ConnectTimeout,

    /// The peer closed the connection.
    #[error("connection closed")]
    ConnectionClosed,

    /// No live session with this identifier.
    #[error("unknown session: {0}")]
    UnknownSession(u64),

    /// A command or event channel is gone.
    #[error("channel error: {message}")]
    Channel {
        /// Error message.
        message: String,
    },
}

impl TransportError {
    /// Creates a channel error.
    pub fn channel(message: impl Into<String>) -> Self {
        Self::Channel {
            message: message.into(),
        }
    }
}
