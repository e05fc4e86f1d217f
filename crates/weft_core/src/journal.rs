//! Append-only snapshot journal.
//!
//! Each commit appends one frame holding a full snapshot:
//!
//! ```text
//! ┌────────────┬──────────────┬──────────────────┬──────────────┐
//! │ magic (4)  │ length (4)   │ snapshot         │ crc32 (4)    │
//! └────────────┴──────────────┴──────────────────┴──────────────┘
//! ```
//!
//! Length and checksum are little-endian; the checksum covers magic, length
//! and snapshot. On open the last complete frame wins. A frame cut short by a
//! crash is the end of the journal and is truncated away. A complete frame
//! with a bad checksum or magic is corruption and fails the open.
//!
//! Compaction replaces the whole journal with a single frame.
//!
//! Frames are not deltas: a commit that changes one entity still writes the
//! whole graph. The journal grows by one snapshot per commit until it passes
//! the store's size limit and is compacted.

use crate::error::{CoreError, CoreResult};
use std::ops::Range;
use tracing::warn;
use weft_storage::StorageBackend;

/// Magic that opens every frame.
pub const FRAME_MAGIC: [u8; 4] = *b"WFJR";

/// Bytes before a frame's payload: magic (4) + length (4).
pub const FRAME_HEADER: usize = 8;

const CRC_SIZE: usize = 4;

/// Bytes a frame adds around its payload.
pub const FRAME_OVERHEAD: usize = FRAME_HEADER + CRC_SIZE;

/// Computes the IEEE CRC32 of `data`.
#[must_use]
pub fn crc32(data: &[u8]) -> u32 {
    const TABLE: [u32; 256] = {
        let mut table = [0u32; 256];
        let mut n = 0;
        while n < 256 {
            let mut value = n as u32;
            let mut bit = 0;
            while bit < 8 {
                value = if value & 1 == 0 {
                    value >> 1
                } else {
                    (value >> 1) ^ 0xEDB8_8320
                };
                bit += 1;
            }
            table[n] = value;
            n += 1;
        }
        table
    };

    !data.iter().fold(0xFFFF_FFFF_u32, |crc, &byte| {
        (crc >> 8) ^ TABLE[((crc ^ u32::from(byte)) & 0xFF) as usize]
    })
}

/// Wraps `payload` in a frame.
///
/// # Errors
///
/// Fails if the payload does not fit a 32-bit length.
pub fn encode_frame(payload: &[u8]) -> CoreResult<Vec<u8>> {
    let len = u32::try_from(payload.len()).map_err(|_| {
        CoreError::invalid_operation(format!("snapshot of {} bytes is too large", payload.len()))
    })?;
    let mut frame = Vec::with_capacity(FRAME_OVERHEAD + payload.len());
    frame.extend_from_slice(&FRAME_MAGIC);
    frame.extend_from_slice(&len.to_le_bytes());
    frame.extend_from_slice(payload);
    let crc = crc32(&frame);
    frame.extend_from_slice(&crc.to_le_bytes());
    Ok(frame)
}

/// Result of scanning journal bytes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Scan {
    /// Payload ranges of complete frames, in journal order.
    pub frames: Vec<Range<usize>>,
    /// Length of the prefix made of complete frames.
    pub valid_len: usize,
}

impl Scan {
    /// Payload of the last complete frame.
    #[must_use]
    pub fn last<'a>(&self, bytes: &'a [u8]) -> Option<&'a [u8]> {
        self.frames.last().map(|range| &bytes[range.clone()])
    }

    /// Bytes after the last complete frame.
    #[must_use]
    pub fn torn_len(&self, total: usize) -> usize {
        total - self.valid_len
    }
}

/// Splits journal bytes into frames.
///
/// # Errors
///
/// Returns `JournalCorruption` for a foreign magic and `ChecksumMismatch` for
/// a complete frame whose checksum does not match.
pub fn scan(bytes: &[u8]) -> CoreResult<Scan> {
    let mut scan = Scan::default();
    let mut offset = 0usize;
    while bytes.len() - offset >= FRAME_HEADER {
        let header = &bytes[offset..offset + FRAME_HEADER];
        if header[..4] != FRAME_MAGIC {
            return Err(CoreError::journal_corruption(format!(
                "bad frame magic at offset {offset}"
            )));
        }
        let len = u32::from_le_bytes([header[4], header[5], header[6], header[7]]) as usize;
        let end = frame_end(offset, len)?;
        if end > bytes.len() {
            break;
        }
        let body_end = end - CRC_SIZE;
        let stored = u32::from_le_bytes([
            bytes[body_end],
            bytes[body_end + 1],
            bytes[body_end + 2],
            bytes[body_end + 3],
        ]);
        let computed = crc32(&bytes[offset..body_end]);
        if stored != computed {
            return Err(CoreError::ChecksumMismatch {
                offset: offset as u64,
                expected: stored,
                actual: computed,
            });
        }
        scan.frames.push(offset + FRAME_HEADER..body_end);
        offset = end;
        scan.valid_len = end;
    }
    Ok(scan)
}

/// End offset of a frame starting at `offset` with a `len` byte payload.
fn frame_end(offset: usize, len: usize) -> CoreResult<usize> {
    offset
        .checked_add(FRAME_OVERHEAD)
        .and_then(|end| end.checked_add(len))
        .ok_or_else(|| {
            CoreError::journal_corruption(format!(
                "frame length {len} at offset {offset} overflows"
            ))
        })
}

/// Snapshot journal over a storage backend.
pub struct Journal {
    backend: Box<dyn StorageBackend>,
    frames: usize,
}

impl Journal {
    /// Wraps a backend. Call [`Self::recover`] before appending.
    #[must_use]
    pub fn new(backend: Box<dyn StorageBackend>) -> Self {
        Self { backend, frames: 0 }
    }

    /// Reads the journal, drops a torn tail and returns the last snapshot.
    ///
    /// # Errors
    ///
    /// Fails on storage errors or corruption, see [`scan`].
    pub fn recover(&mut self) -> CoreResult<Option<Vec<u8>>> {
        let bytes = self.backend.read_all()?;
        let scan = scan(&bytes)?;
        let torn = scan.torn_len(bytes.len());
        if torn > 0 {
            warn!(
                torn_bytes = torn,
                valid_len = scan.valid_len,
                "dropping incomplete journal frame"
            );
            self.backend.truncate(scan.valid_len as u64)?;
        }
        self.frames = scan.frames.len();
        Ok(scan.last(&bytes).map(<[u8]>::to_vec))
    }

    /// Appends a snapshot frame, syncing if asked. Returns the frame offset.
    ///
    /// # Errors
    ///
    /// Fails on storage errors or an oversized payload.
    pub fn append(&mut self, payload: &[u8], sync: bool) -> CoreResult<u64> {
        let frame = encode_frame(payload)?;
        let offset = self.backend.append(&frame)?;
        if sync {
            self.backend.sync()?;
        }
        self.frames += 1;
        Ok(offset)
    }

    /// Replaces the journal with a single frame.
    ///
    /// # Errors
    ///
    /// Fails on storage errors or an oversized payload.
    pub fn rewrite(&mut self, payload: &[u8]) -> CoreResult<()> {
        let frame = encode_frame(payload)?;
        self.backend.replace(&frame)?;
        self.frames = 1;
        Ok(())
    }

    /// Flushes the backend to durable storage.
    ///
    /// # Errors
    ///
    /// Propagates storage errors.
    pub fn sync(&mut self) -> CoreResult<()> {
        Ok(self.backend.sync()?)
    }

    /// Current journal size in bytes.
    ///
    /// # Errors
    ///
    /// Propagates storage errors.
    pub fn size(&self) -> CoreResult<u64> {
        Ok(self.backend.size()?)
    }

    /// Number of complete frames.
    #[must_use]
    pub fn frames(&self) -> usize {
        self.frames
    }
}

impl std::fmt::Debug for Journal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Journal")
            .field("frames", &self.frames)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_storage::InMemoryBackend;

    #[test]
    fn crc32_known_value() {
        assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
        assert_eq!(crc32(b""), 0);
    }

    #[test]
    fn last_frame_wins() {
        let backend = InMemoryBackend::new();
        let mut journal = Journal::new(Box::new(backend.clone()));
        journal.append(b"first", false).unwrap();
        journal.append(b"second", true).unwrap();

        let mut reopened = Journal::new(Box::new(backend));
        assert_eq!(reopened.recover().unwrap(), Some(b"second".to_vec()));
        assert_eq!(reopened.frames(), 2);
    }

    #[test]
    fn empty_journal_recovers_nothing() {
        let mut journal = Journal::new(Box::new(InMemoryBackend::new()));
        assert_eq!(journal.recover().unwrap(), None);
    }

    #[test]
    fn torn_tail_is_truncated() {
        let mut bytes = encode_frame(b"kept").unwrap();
        let kept_len = bytes.len();
        let torn = encode_frame(b"lost in a crash").unwrap();
        bytes.extend_from_slice(&torn[..torn.len() - 3]);
        let backend = InMemoryBackend::with_data(bytes);

        let mut journal = Journal::new(Box::new(backend.clone()));
        assert_eq!(journal.recover().unwrap(), Some(b"kept".to_vec()));
        assert_eq!(backend.data().len(), kept_len);

        journal.append(b"next", false).unwrap();
        let mut reopened = Journal::new(Box::new(backend));
        assert_eq!(reopened.recover().unwrap(), Some(b"next".to_vec()));
    }

    #[test]
    fn partial_header_is_torn_tail() {
        let mut bytes = encode_frame(b"kept").unwrap();
        bytes.extend_from_slice(&FRAME_MAGIC[..2]);
        let scan = scan(&bytes).unwrap();
        assert_eq!(scan.frames.len(), 1);
        assert_eq!(scan.torn_len(bytes.len()), 2);
    }

    #[test]
    fn flipped_bit_is_checksum_mismatch() {
        let mut bytes = encode_frame(b"payload").unwrap();
        bytes[FRAME_HEADER] ^= 0x01;
        assert!(matches!(
            scan(&bytes),
            Err(CoreError::ChecksumMismatch { offset: 0, .. })
        ));
    }

    #[test]
    fn foreign_magic_is_corruption() {
        let mut bytes = encode_frame(b"payload").unwrap();
        bytes[0] = b'X';
        assert!(matches!(
            scan(&bytes),
            Err(CoreError::JournalCorruption { .. })
        ));
    }

    #[test]
    fn oversized_length_is_torn_tail() {
        let mut bytes = encode_frame(b"kept").unwrap();
        let kept_len = bytes.len();
        bytes.extend_from_slice(&FRAME_MAGIC);
        bytes.extend_from_slice(&u32::MAX.to_le_bytes());
        bytes.extend_from_slice(b"short");

        let scan = scan(&bytes).unwrap();
        assert_eq!(scan.frames.len(), 1);
        assert_eq!(scan.valid_len, kept_len);
    }

    #[test]
    fn overflowing_frame_end_is_corruption() {
        assert_eq!(frame_end(16, 4).unwrap(), 16 + FRAME_OVERHEAD + 4);
        assert!(matches!(
            frame_end(usize::MAX - FRAME_OVERHEAD, 1),
            Err(CoreError::JournalCorruption { .. })
        ));
        assert!(matches!(
            frame_end(0, usize::MAX),
            Err(CoreError::JournalCorruption { .. })
        ));
    }

    #[test]
    fn rewrite_leaves_single_frame() {
        let backend = InMemoryBackend::new();
        let mut journal = Journal::new(Box::new(backend.clone()));
        journal.append(b"one", false).unwrap();
        journal.append(b"two", false).unwrap();
        journal.rewrite(b"three").unwrap();
        assert_eq!(journal.frames(), 1);
        assert_eq!(backend.data(), encode_frame(b"three").unwrap());
    }
}
