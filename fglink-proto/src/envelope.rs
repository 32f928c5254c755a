//! Message envelope: the self-describing header preceding every message.
//!
//! # Wire Format
//! ```text
//! +0: blockLength  (u16, 2 bytes)  length of the fixed block
//! +2: kind         (u16, 2 bytes)  message kind tag
//! +4: schemaId     (u16, 2 bytes)  constant 0x4647
//! +6: version      (u16, 2 bytes)  schema version
//! ```
//!
//! All fields are little-endian. [`Envelope::verify`] is the gate applied
//! before any field of the payload is read.

use crate::error::{ProtoError, Result};
use crate::wire::{WireReader, WireWriter};

/// Schema identifier carried by every message ("FG" in little-endian).
pub const SCHEMA_ID: u16 = 0x4647;

/// Highest schema version this codec understands.
pub const SCHEMA_VERSION: u16 = 1;

/// Message kind tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum MessageKind {
    /// Discrete operation request.
    Command = 1,
    /// Lifecycle and health report.
    Status = 2,
    /// High-rate vehicle state sample.
    Telemetry = 3,
    /// High-rate control-axis sample.
    Control = 4,
}

impl MessageKind {
    /// Wire tag for this kind.
    #[must_use]
    pub const fn tag(self) -> u16 {
        self as u16
    }

    /// Looks up the kind for a wire tag.
    #[must_use]
    pub fn from_tag(tag: u16) -> Option<Self> {
        match tag {
            1 => Some(Self::Command),
            2 => Some(Self::Status),
            3 => Some(Self::Telemetry),
            4 => Some(Self::Control),
            _ => None,
        }
    }
}

/// Decoded 8-byte message envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Envelope {
    /// Length of the fixed block following the envelope.
    pub block_length: u16,
    /// Message kind tag.
    pub kind: u16,
    /// Schema identifier.
    pub schema_id: u16,
    /// Schema version number.
    pub version: u16,
}

impl Envelope {
    /// Encoded length of the envelope in bytes.
    pub const ENCODED_LENGTH: usize = 8;

    /// Creates an envelope for the current schema.
    #[must_use]
    pub fn new(block_length: u16, kind: MessageKind) -> Self {
        Self {
            block_length,
            kind: kind.tag(),
            schema_id: SCHEMA_ID,
            version: SCHEMA_VERSION,
        }
    }

    /// Decodes the envelope at the start of `buf`.
    ///
    /// # Errors
    /// Returns [`ProtoError::BufferTooShort`] if fewer than 8 bytes are
    /// available.
    pub fn read(buf: &[u8]) -> Result<Self> {
        let mut r = WireReader::new(buf);
        Ok(Self {
            block_length: r.read_u16()?,
            kind: r.read_u16()?,
            schema_id: r.read_u16()?,
            version: r.read_u16()?,
        })
    }

    /// Writes the envelope to `w`.
    pub fn write(&self, w: &mut WireWriter) {
        w.put_u16(self.block_length);
        w.put_u16(self.kind);
        w.put_u16(self.schema_id);
        w.put_u16(self.version);
    }

    /// Verifies that `buf` holds a well-formed message of the expected kind.
    ///
    /// Checks, in order: envelope present, schema id, kind tag, version not
    /// newer than supported, block length matching the kind's layout, and the
    /// buffer covering the whole fixed block. Only after this gate passes may
    /// payload fields be read.
    ///
    /// # Errors
    /// Returns the first failing check as a typed [`ProtoError`].
    pub fn verify(buf: &[u8], kind: MessageKind, block_length: u16) -> Result<Self> {
        let envelope = Self::read(buf)?;
        if envelope.schema_id != SCHEMA_ID {
            return Err(ProtoError::SchemaMismatch {
                expected: SCHEMA_ID,
                actual: envelope.schema_id,
            });
        }
        if envelope.kind != kind.tag() {
            return Err(ProtoError::KindMismatch {
                expected: kind.tag(),
                actual: envelope.kind,
            });
        }
        if envelope.version > SCHEMA_VERSION {
            return Err(ProtoError::VersionIncompatible {
                message_version: envelope.version,
                max_supported: SCHEMA_VERSION,
            });
        }
        if envelope.block_length != block_length {
            return Err(ProtoError::BlockLengthMismatch {
                expected: block_length,
                actual: envelope.block_length,
            });
        }
        let required = Self::ENCODED_LENGTH + envelope.block_length as usize;
        if buf.len() < required {
            return Err(ProtoError::BufferTooShort {
                required,
                available: buf.len(),
            });
        }
        Ok(envelope)
    }
}

/// Reads the message kind from an encoded buffer without decoding the payload.
///
/// Lets the application dispatch to the right decoder.
///
/// # Errors
/// Fails on short buffers, foreign schemas, and unknown kind tags.
pub fn peek_kind(buf: &[u8]) -> Result<MessageKind> {
    let envelope = Envelope::read(buf)?;
    if envelope.schema_id != SCHEMA_ID {
        return Err(ProtoError::SchemaMismatch {
            expected: SCHEMA_ID,
            actual: envelope.schema_id,
        });
    }
    MessageKind::from_tag(envelope.kind).ok_or(ProtoError::InvalidEnumValue {
        field: "kind",
        value: u64::from(envelope.kind),
    })
}
