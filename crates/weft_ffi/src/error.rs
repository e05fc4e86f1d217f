//! Error codes and result types.

use crate::buffer::WeftArray;
use weft_core::CoreError;
use weft_sync_protocol::ProtocolError;

/// Kind of failure.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeftErrorCode {
    /// A write broke a sticky or acyclic constraint.
    ConstraintViolation = 1,
    /// Snapshot, journal, version or action bytes could not be read.
    Malformed = 2,
    /// Persistence failed.
    Io = 3,
    /// The store was used after close.
    Closed = 4,
    /// Another process holds the store directory.
    Locked = 5,
    /// Null handle, bad path or similar misuse.
    InvalidArgument = 6,
}

/// A failure with its code and a UTF-8 message.
///
/// Release with `weft_release_error`.
#[repr(C)]
#[derive(Debug)]
pub struct WeftError {
    /// Kind of failure.
    pub code: WeftErrorCode,
    /// UTF-8 message, not NUL-terminated.
    pub message: WeftArray<u8>,
}

impl WeftError {
    /// Creates an error.
    pub fn new(code: WeftErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: WeftArray::from_vec(message.into().into_bytes()),
        }
    }

    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(WeftErrorCode::InvalidArgument, message)
    }

    pub(crate) fn null_handle() -> Self {
        Self::invalid_argument("null store handle")
    }
}

impl From<CoreError> for WeftError {
    fn from(error: CoreError) -> Self {
        let code = match &error {
            CoreError::ConstraintViolation(_) => WeftErrorCode::ConstraintViolation,
            CoreError::Codec(_)
            | CoreError::JournalCorruption { .. }
            | CoreError::InvalidFormat { .. }
            | CoreError::ChecksumMismatch { .. } => WeftErrorCode::Malformed,
            CoreError::Storage(_) | CoreError::Io(_) => WeftErrorCode::Io,
            CoreError::StoreClosed => WeftErrorCode::Closed,
            CoreError::StoreLocked => WeftErrorCode::Locked,
            CoreError::InvalidOperation { .. } => WeftErrorCode::InvalidArgument,
        };
        Self::new(code, error.to_string())
    }
}

impl From<ProtocolError> for WeftError {
    fn from(error: ProtocolError) -> Self {
        Self::new(WeftErrorCode::Malformed, error.to_string())
    }
}

/// Either a value or a [`WeftError`].
#[repr(C, u8)]
#[derive(Debug)]
pub enum WeftResult<T> {
    /// Success.
    Ok(T),
    /// Failure.
    Err(WeftError),
}

impl<T> WeftResult<T> {
    /// Returns true on success.
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    /// Converts into a Rust result.
    pub fn into_result(self) -> Result<T, WeftError> {
        match self {
            Self::Ok(value) => Ok(value),
            Self::Err(error) => Err(error),
        }
    }
}

impl<T, E: Into<WeftError>> From<Result<T, E>> for WeftResult<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::Ok(value),
            Err(error) => Self::Err(error.into()),
        }
    }
}

/// Releases an error.
///
/// # Safety
///
/// `error` must have been returned by this library and not released before.
#[no_mangle]
pub unsafe extern "C" fn weft_release_error(error: WeftError) {
    drop(error.message.into_vec());
}
