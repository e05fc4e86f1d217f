//! # Weft Codec
//!
//! Encoding shared by Weft snapshots and sync messages.
//!
//! Values are serialized with `serde` into CBOR. Encoding is deterministic as
//! long as callers stick to ordered containers (`BTreeMap`, `Vec`), which every
//! Weft blob does. Each persisted or exchanged blob is wrapped in an
//! [`Envelope`]: a 4-byte magic, a little-endian `u16` format version and the
//! CBOR body. Readers reject foreign magics, versions newer than they
//! understand, and trailing bytes.
//!
//! ## Usage
//!
//! ```
//! use weft_codec::Envelope;
//!
//! const NOTES: Envelope = Envelope::new(*b"NOTE", 1);
//!
//! let blob = NOTES.seal(&vec![1u64, 2, 3]).unwrap();
//! assert_eq!(&blob[..4], b"NOTE");
//! let back: Vec<u64> = NOTES.open(&blob).unwrap();
//! assert_eq!(back, vec![1, 2, 3]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod byte_buf;
mod cbor;
mod envelope;
mod error;

pub use cbor::{from_cbor, to_cbor};
pub use envelope::{Envelope, ENVELOPE_HEADER_SIZE};
pub use error::{CodecError, CodecResult};
