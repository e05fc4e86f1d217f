//! Error types for the sync protocol.

use thiserror::Error;
use weft_codec::CodecError;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors raised while encoding or decoding sync messages.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The message itself could not be read.
    #[error("malformed message: {0}")]
    Codec(#[from] CodecError),

    /// One action inside an otherwise readable batch could not be decoded.
    #[error("malformed action at index {index}: {message}")]
    MalformedAction {
        /// Position of the action in the batch.
        index: usize,
        /// Decoder message.
        message: String,
    },
}

impl ProtocolError {
    /// Creates a malformed action error.
    pub fn malformed_action(index: usize, message: impl Into<String>) -> Self {
        Self::MalformedAction {
            index,
            message: message.into(),
        }
    }
}
