//! # Weft Storage
//!
//! Byte-store backends used by the Weft snapshot journal.
//!
//! A backend is an append-only byte sequence that can be read back at an
//! offset, made durable, and cut short. It knows nothing about frames,
//! snapshots or graphs; `weft_core` owns every byte layout.
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - shared, clonable buffer for tests and ephemeral stores
//! - [`FileBackend`] - a single OS file
//!
//! ## Example
//!
//! ```rust
//! use weft_storage::{InMemoryBackend, StorageBackend};
//!
//! let mut backend = InMemoryBackend::new();
//! backend.append(b"frame one").unwrap();
//! let offset = backend.append(b"frame two").unwrap();
//! assert_eq!(backend.read_at(offset, 9).unwrap(), b"frame two");
//! assert_eq!(backend.read_all().unwrap().len(), 18);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
