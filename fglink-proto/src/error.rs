//! Error types for codec operations.

use thiserror::Error;

/// Error type for encoding and decoding wire messages.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtoError {
    /// Buffer is too short for the requested read.
    #[error("buffer too short: required {required} bytes, available {available} bytes")]
    BufferTooShort {
        /// Bytes required to complete the read.
        required: usize,
        /// Bytes actually available.
        available: usize,
    },

    /// Message kind tag does not match the expected kind.
    #[error("kind mismatch: expected {expected}, actual {actual}")]
    KindMismatch {
        /// Expected kind tag.
        expected: u16,
        /// Kind tag found in the envelope.
        actual: u16,
    },

    /// Schema identifier mismatch.
    #[error("schema mismatch: expected {expected:#06x}, actual {actual:#06x}")]
    SchemaMismatch {
        /// Expected schema identifier.
        expected: u16,
        /// Schema identifier found in the envelope.
        actual: u16,
    },

    /// Message was produced by a newer, unsupported schema version.
    #[error(
        "version incompatible: message version {message_version}, max supported {max_supported}"
    )]
    VersionIncompatible {
        /// Version found in the envelope.
        message_version: u16,
        /// Highest version this codec understands.
        max_supported: u16,
    },

    /// Block length in the envelope does not match the kind's layout.
    #[error("block length mismatch: expected {expected}, actual {actual}")]
    BlockLengthMismatch {
        /// Expected block length for the kind.
        expected: u16,
        /// Block length found in the envelope.
        actual: u16,
    },

    /// Invalid enum value encountered while decoding.
    #[error("invalid enum value: field {field}, value {value}")]
    InvalidEnumValue {
        /// Name of the offending field.
        field: &'static str,
        /// Value found on the wire.
        value: u64,
    },

    /// Invalid UTF-8 in a string field.
    #[error("invalid UTF-8 at offset {offset}")]
    InvalidUtf8 {
        /// Byte offset of the string field.
        offset: usize,
    },
}

/// Result type alias for codec operations.
pub type Result<T> = std::result::Result<T, ProtoError>;
