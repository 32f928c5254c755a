//! # fglink-transport
//!
//! Asynchronous transport layer for the fglink simulator link.
//!
//! This crate provides:
//! - [`tcp`] - stream client, stream server with per-connection sessions,
//!   and length-prefixed message framing
//! - [`udp`] - connectionless datagram client for high-rate, possibly-lossy
//!   samples
//!
//! Each component is an actor task: commands go in through a handle, typed
//! events come out through a channel. Every socket is owned by exactly one
//! task for its whole lifetime, and shutdown is explicit via cancellation
//! tokens.

pub mod error;
pub mod tcp;
pub mod udp;

pub use error::TransportError;

/// Default TCP port for the command/status channel.
pub const DEFAULT_TCP_PORT: u16 = 5502;

/// Default UDP port for the telemetry/control channel.
pub const DEFAULT_UDP_PORT: u16 = 5501;

/// Default maximum encoded message size in bytes.
pub const MAX_FRAME_SIZE: usize = 64 * 1024;
