//! # Weft Sync Engine
//!
//! Version-vector synchronization between Weft replicas.
//!
//! This crate provides:
//! - The three-step exchange: `version`, `actions`, `join`
//! - A pull-then-push cycle between two engines (`sync_with`)
//! - A store-backed applier that settles and commits once per transfer
//! - Per-engine statistics and join reports
//!
//! ## Architecture
//!
//! Replicas are peers; none is authoritative. A round goes:
//! 1. The receiver encodes its version vectors (`version`)
//! 2. The sender answers with every entity state that version has not seen
//!    (`actions`)
//! 3. The receiver merges the states in stamp order, breaks any cycle the
//!    merged edges closed under an acyclic label, and commits (`join`)
//!
//! Blobs are opaque bytes, so any transport that can move them works.
//!
//! ## Guarantees
//!
//! - Joining the same blob twice changes nothing the second time
//! - Replicas with the same constraint declarations that have exchanged
//!   everything hold identical state
//! - A malformed or rejected action never stops the rest of its batch

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod applier;
mod config;
mod engine;
mod error;

pub use applier::{StoreApplier, SyncApplier};
pub use config::SyncConfig;
pub use engine::{JoinReport, Rejection, SyncCycleResult, SyncEngine, SyncState, SyncStats};
pub use error::{SyncError, SyncResult};
