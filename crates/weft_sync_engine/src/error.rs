//! Error types for the sync engine.

use thiserror::Error;
use weft_core::CoreError;
use weft_sync_protocol::ProtocolError;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during sync operations.
///
/// Per-action problems (constraint violations, undecodable actions) are not
/// errors; they are reported in a [`JoinReport`](crate::JoinReport).
#[derive(Error, Debug)]
pub enum SyncError {
    /// A message could not be encoded or decoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The store failed.
    #[error("store error: {0}")]
    Store(#[from] CoreError),

    /// A sync cycle was started while another was running.
    #[error("invalid state transition from {from:?} to {to:?}")]
    InvalidStateTransition {
        /// Current state.
        from: String,
        /// Attempted target state.
        to: String,
    },
}

impl SyncError {
    /// Returns true if the store was closed underneath the engine.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Store(CoreError::StoreClosed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_lower_layers() {
        let err: SyncError = ProtocolError::malformed_action(0, "eof").into();
        assert!(err.to_string().starts_with("protocol error"));
        assert!(!err.is_closed());

        let err: SyncError = CoreError::StoreClosed.into();
        assert!(err.is_closed());
    }
}
