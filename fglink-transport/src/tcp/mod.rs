//! TCP transport: stream client, server, per-connection sessions, framing.

pub mod client;
pub mod framing;
pub mod server;
pub mod session;

pub use client::{ClientCommand, ClientEvent, ClientHandle, StreamClient, StreamClientConfig};
pub use framing::FrameCodec;
pub use server::{ServerEvent, ServerHandle, StreamServer, StreamServerConfig};
pub use session::{SessionId, SessionRegistry};

/// True for I/O errors that mean the peer went away, as opposed to a local
/// fault. Peer departure is a normal disconnection, not an error.
pub(crate) fn is_peer_gone(error: &std::io::Error) -> bool {
    matches!(
        error.kind(),
        std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::BrokenPipe
            | std::io::ErrorKind::UnexpectedEof
    )
}
