//! # fglink-proto
//!
//! Binary message codec for the fglink simulator link.
//!
//! Four message kinds travel between a control application and a remote
//! simulation host:
//! - [`Command`] - discrete operation requests (start, stop, configure, ...)
//! - [`Status`] - lifecycle and health reports from the simulation host
//! - [`Telemetry`] - high-rate vehicle state samples
//! - [`Control`] - high-rate control-axis samples
//!
//! Every encoded message is a self-describing buffer: an 8-byte [`Envelope`]
//! followed by a fixed block and an optional variable-length section. Decoding
//! verifies the envelope before touching any field, so malformed, truncated,
//! or mis-tagged buffers produce a typed [`ProtoError`] instead of a crash or
//! an out-of-bounds read.

pub mod command;
pub mod control;
pub mod envelope;
pub mod error;
pub mod status;
pub mod telemetry;
pub mod wire;

pub use command::{Command, CommandType, SimConfig};
pub use control::Control;
pub use envelope::{Envelope, MessageKind, SCHEMA_ID, SCHEMA_VERSION, peek_kind};
pub use error::{ProtoError, Result};
pub use status::{SimState, Status};
pub use telemetry::Telemetry;

/// Current wall-clock time in milliseconds since the Unix epoch.
///
/// Used to fill zero timestamps at encode time.
pub(crate) fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
