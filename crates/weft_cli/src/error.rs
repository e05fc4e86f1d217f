//! CLI errors.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for CLI commands.
pub type CliResult<T> = Result<T, CliError>;

/// Errors reported by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// The command needs `--path`.
    #[error("store path required for {0}")]
    MissingPath(&'static str),

    /// Nothing that looks like a store at the path.
    #[error("no store found at {}", .0.display())]
    NoStore(PathBuf),

    /// The journal failed verification.
    #[error("verification failed: {0}")]
    VerificationFailed(String),

    /// Store error.
    #[error(transparent)]
    Core(#[from] weft_core::CoreError),

    /// Storage error.
    #[error(transparent)]
    Storage(#[from] weft_storage::StorageError),

    /// Sync message error.
    #[error(transparent)]
    Protocol(#[from] weft_sync_protocol::ProtocolError),

    /// JSON output error.
    #[error("JSON output failed: {0}")]
    Json(#[from] serde_json::Error),
}
