//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors raised while encoding or decoding blobs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Serialization failed.
    #[error("encoding failed: {message}")]
    EncodingFailed {
        /// Underlying serializer message.
        message: String,
    },

    /// The CBOR body could not be decoded into the requested type.
    #[error("decoding failed: {message}")]
    DecodingFailed {
        /// Underlying deserializer message.
        message: String,
    },

    /// Bytes remained after a complete value.
    #[error("{count} trailing bytes after encoded value")]
    TrailingBytes {
        /// Number of unread bytes.
        count: usize,
    },

    /// The input ended before the envelope header did.
    #[error("blob too short: need {needed} bytes, got {available}")]
    Truncated {
        /// Bytes required.
        needed: usize,
        /// Bytes supplied.
        available: usize,
    },

    /// The blob starts with a different magic.
    #[error("unexpected blob magic {found:?}, expected {expected:?}")]
    BadMagic {
        /// Magic the reader expects.
        expected: [u8; 4],
        /// Magic found in the blob.
        found: [u8; 4],
    },

    /// The blob was written by a newer format than this reader supports.
    #[error("unsupported format version {found}, newest supported is {supported}")]
    UnsupportedVersion {
        /// Version found in the blob.
        found: u16,
        /// Newest version this reader understands.
        supported: u16,
    },
}

impl CodecError {
    /// Creates an encoding failed error.
    pub fn encoding_failed(message: impl Into<String>) -> Self {
        Self::EncodingFailed {
            message: message.into(),
        }
    }

    /// Creates a decoding failed error.
    pub fn decoding_failed(message: impl Into<String>) -> Self {
        Self::DecodingFailed {
            message: message.into(),
        }
    }
}
