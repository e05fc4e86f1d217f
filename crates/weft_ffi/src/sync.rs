//! The three sync calls.
//!
//! `weft_sync_version` on the receiver, `weft_sync_actions` on the sender
//! with that version, then `weft_sync_join` on the receiver with the actions.
//! Joined actions are pending until the receiver commits.

use crate::buffer::{input, WeftArray};
use crate::error::{WeftError, WeftResult};
use crate::store::{store_mut, store_ref, WeftStore};
use weft_core::{Action, ApplyOutcome, Store};
use weft_sync_protocol::{ActionsMessage, VersionMessage};

/// Counts of what a join did.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WeftJoinSummary {
    /// Actions that became the entity's state.
    pub applied: u64,
    /// Actions older than the entity's state.
    pub superseded: u64,
    /// Actions seen before.
    pub duplicates: u64,
    /// Actions dropped for breaking a constraint.
    pub rejected: u64,
    /// Actions that could not be decoded.
    pub malformed: u64,
}

/// Encodes the store's version vectors.
///
/// # Safety
///
/// `handle` must be a live handle.
#[no_mangle]
pub unsafe extern "C" fn weft_sync_version(handle: *const WeftStore) -> WeftResult<WeftArray<u8>> {
    store_ref(handle)
        .and_then(|store| {
            let version = store.version()?;
            Ok(VersionMessage::new(version).encode()?)
        })
        .map(WeftArray::from_vec)
        .into()
}

/// Encodes every action the peer version has not seen.
///
/// # Safety
///
/// `handle` must be a live handle and `version` must point to `len` readable
/// bytes.
#[no_mangle]
pub unsafe extern "C" fn weft_sync_actions(
    handle: *const WeftStore,
    version: *const u8,
    len: usize,
) -> WeftResult<WeftArray<u8>> {
    input(version, len)
        .and_then(|bytes| {
            let store = store_ref(handle)?;
            let peer = VersionMessage::decode(bytes)?.version;
            Ok(ActionsMessage::new(store.actions(&peer)?).encode()?)
        })
        .map(WeftArray::from_vec)
        .into()
}

/// Merges an actions blob into the store.
///
/// Malformed and rejected actions are counted and skipped. Merged edges
/// that close a cycle under an acyclic label are then settled, and the ones
/// removed count as rejected. The merge is not committed.
///
/// # Safety
///
/// `handle` must be a live handle and `actions` must point to `len` readable
/// bytes.
#[no_mangle]
pub unsafe extern "C" fn weft_sync_join(
    handle: *mut WeftStore,
    actions: *const u8,
    len: usize,
) -> WeftResult<WeftJoinSummary> {
    input(actions, len)
        .and_then(|bytes| {
            let store = store_mut(handle)?;
            join(store, bytes)
        })
        .into()
}

fn join(store: &mut Store, bytes: &[u8]) -> Result<WeftJoinSummary, WeftError> {
    let decoded = ActionsMessage::decode_lenient(bytes)?;
    let mut summary = WeftJoinSummary {
        malformed: decoded.malformed.len() as u64,
        ..WeftJoinSummary::default()
    };
    let mut actions = decoded.actions;
    actions.sort_by_key(Action::order_key);
    for action in actions {
        match store.apply_action(action)? {
            ApplyOutcome::Applied => summary.applied += 1,
            ApplyOutcome::Superseded => summary.superseded += 1,
            ApplyOutcome::Duplicate => summary.duplicates += 1,
            ApplyOutcome::Rejected(_) => summary.rejected += 1,
        }
    }
    summary.rejected += store.settle()?.len() as u64;
    Ok(summary)
}
