//! Versioned blob envelope.

use crate::cbor::{from_cbor, to_cbor};
use crate::error::{CodecError, CodecResult};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Size of the envelope header: magic (4) + version (2).
pub const ENVELOPE_HEADER_SIZE: usize = 6;

/// Describes one blob family: its magic and the newest version written.
///
/// Blobs are laid out as:
///
/// ```text
/// ┌────────────┬──────────────┬──────────────────┐
/// │ magic (4)  │ version (2)  │ CBOR body        │
/// └────────────┴──────────────┴──────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Envelope {
    magic: [u8; 4],
    version: u16,
}

impl Envelope {
    /// Creates an envelope description.
    #[must_use]
    pub const fn new(magic: [u8; 4], version: u16) -> Self {
        Self { magic, version }
    }

    /// Returns the magic bytes.
    #[must_use]
    pub const fn magic(&self) -> [u8; 4] {
        self.magic
    }

    /// Returns the version this envelope writes.
    #[must_use]
    pub const fn version(&self) -> u16 {
        self.version
    }

    /// Encodes `value` behind this envelope's header.
    ///
    /// # Errors
    ///
    /// Returns `EncodingFailed` if the value cannot be serialized.
    pub fn seal<T: Serialize + ?Sized>(&self, value: &T) -> CodecResult<Vec<u8>> {
        let body = to_cbor(value)?;
        let mut blob = Vec::with_capacity(ENVELOPE_HEADER_SIZE + body.len());
        blob.extend_from_slice(&self.magic);
        blob.extend_from_slice(&self.version.to_le_bytes());
        blob.extend_from_slice(&body);
        Ok(blob)
    }

    /// Checks the header of `blob` and returns the version it was written with.
    ///
    /// # Errors
    ///
    /// Fails on short input, a foreign magic, or a version newer than
    /// [`Self::version`].
    pub fn check(&self, blob: &[u8]) -> CodecResult<u16> {
        if blob.len() < ENVELOPE_HEADER_SIZE {
            return Err(CodecError::Truncated {
                needed: ENVELOPE_HEADER_SIZE,
                available: blob.len(),
            });
        }
        let mut found = [0u8; 4];
        found.copy_from_slice(&blob[..4]);
        if found != self.magic {
            return Err(CodecError::BadMagic {
                expected: self.magic,
                found,
            });
        }
        let version = u16::from_le_bytes([blob[4], blob[5]]);
        if version > self.version {
            return Err(CodecError::UnsupportedVersion {
                found: version,
                supported: self.version,
            });
        }
        Ok(version)
    }

    /// Checks the header and decodes the body of `blob`.
    ///
    /// # Errors
    ///
    /// Fails as [`Self::check`] does, or if the body is malformed.
    pub fn open<T: DeserializeOwned>(&self, blob: &[u8]) -> CodecResult<T> {
        self.check(blob)?;
        from_cbor(&blob[ENVELOPE_HEADER_SIZE..])
    }
}
