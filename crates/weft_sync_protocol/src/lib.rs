//! # Weft Sync Protocol
//!
//! Messages exchanged between Weft replicas and their encoding.
//!
//! This crate provides:
//! - [`VersionMessage`] carrying a replica's per-kind version vectors
//! - [`ActionsMessage`] carrying stamped entity states
//! - Envelope constants for both blob families
//!
//! This is a pure protocol crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod messages;

pub use error::{ProtocolError, ProtocolResult};
pub use messages::{
    ActionsMessage, DecodedActions, MalformedAction, VersionMessage, ACTIONS_ENVELOPE,
    VERSION_ENVELOPE,
};
