//! # Weft FFI
//!
//! Stable C ABI for Weft bindings.
//!
//! This crate provides:
//! - Opaque store handles and their lifecycle
//! - Entity reads and writes, constraint declarations and index queries
//! - Change events through `weft_barrier`
//! - The three sync calls over opaque byte blobs
//!
//! ## Memory ownership
//!
//! Every array, error and optional atom handed to the caller is owned by the
//! caller until it is passed back to the matching `weft_release_*` function.
//! Input pointers are borrowed for the duration of the call only.
//!
//! ## Results
//!
//! Fallible calls return a [`WeftResult`]: a tagged union holding either the
//! value or a [`WeftError`] with a [`WeftErrorCode`] and a UTF-8 message.

mod buffer;
mod error;
mod events;
mod query;
mod store;
mod sync;
mod types;

pub use buffer::{weft_release_bytes, weft_release_ids, WeftArray};
pub use error::{weft_release_error, WeftError, WeftErrorCode, WeftResult};
pub use events::{weft_barrier, weft_release_events, WeftEvent};
pub use query::{
    weft_atoms_by_label, weft_atoms_by_label_value, weft_atoms_by_src, weft_atoms_by_src_label,
    weft_edges_by_dst, weft_edges_by_dst_label, weft_edges_by_src, weft_edges_by_src_label,
    weft_nodes_by_label, weft_release_atoms, weft_release_edges,
};
pub use store::{
    weft_close, weft_commit, weft_declare_acyclic, weft_declare_sticky, weft_get_atom,
    weft_get_edge, weft_get_node, weft_mint, weft_open, weft_open_snapshot, weft_release_atom,
    weft_remove_atom, weft_remove_edge, weft_remove_node, weft_set_atom, weft_set_edge,
    weft_set_node, weft_snapshot, WeftStore,
};
pub use sync::{weft_sync_actions, weft_sync_join, weft_sync_version, WeftJoinSummary};
pub use types::{
    WeftAtom, WeftAtomEntry, WeftEdge, WeftEdgeEntry, WeftId, WeftKind, WeftNode, WeftOption,
    WeftUnit,
};
