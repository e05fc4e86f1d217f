//! Error types for Weft core.

use crate::constraints::Violation;
use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in Weft core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] weft_storage::StorageError),

    /// CBOR codec error.
    #[error("codec error: {0}")]
    Codec(#[from] weft_codec::CodecError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A write broke a declared constraint. The store is unchanged.
    #[error("constraint violation: {0}")]
    ConstraintViolation(#[from] Violation),

    /// Journal frame is corrupted.
    #[error("journal corruption: {message}")]
    JournalCorruption {
        /// Description of the corruption.
        message: String,
    },

    /// Invalid snapshot format or version.
    #[error("invalid store format: {message}")]
    InvalidFormat {
        /// Description of the format issue.
        message: String,
    },

    /// Checksum mismatch detected.
    #[error("checksum mismatch at offset {offset}: expected {expected:08x}, got {actual:08x}")]
    ChecksumMismatch {
        /// Byte offset of the frame.
        offset: u64,
        /// Expected checksum.
        expected: u32,
        /// Actual checksum.
        actual: u32,
    },

    /// The store directory is locked by another process.
    #[error("store locked: another process has exclusive access")]
    StoreLocked,

    /// Operation not permitted in current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why operation is invalid.
        message: String,
    },

    /// Store is closed.
    #[error("store is closed")]
    StoreClosed,
}

impl CoreError {
    /// Creates a journal corruption error.
    pub fn journal_corruption(message: impl Into<String>) -> Self {
        Self::JournalCorruption {
            message: message.into(),
        }
    }

    /// Creates an invalid format error.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Returns the violation if this error is a constraint violation.
    #[must_use]
    pub fn violation(&self) -> Option<&Violation> {
        match self {
            Self::ConstraintViolation(violation) => Some(violation),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::Id;
    use crate::types::{Kind, Label};

    #[test]
    fn violation_converts_and_displays() {
        let violation = Violation::Sticky {
            kind: Kind::Node,
            id: Id::from_u128(1),
            label: Label(4),
        };
        let error = CoreError::from(violation.clone());
        assert_eq!(error.violation(), Some(&violation));
        assert!(error.to_string().starts_with("constraint violation: node"));
    }

    #[test]
    fn checksum_display_is_hex() {
        let error = CoreError::ChecksumMismatch {
            offset: 12,
            expected: 0xdead_beef,
            actual: 1,
        };
        assert_eq!(
            error.to_string(),
            "checksum mismatch at offset 12: expected deadbeef, got 00000001"
        );
    }

    #[test]
    fn closed_display() {
        assert_eq!(CoreError::StoreClosed.to_string(), "store is closed");
    }
}
