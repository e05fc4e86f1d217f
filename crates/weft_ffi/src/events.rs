//! Change events.

use crate::buffer::WeftArray;
use crate::error::{WeftError, WeftResult};
use crate::store::{store_mut, WeftStore};
use crate::types::{WeftAtom, WeftEdge, WeftId, WeftNode, WeftOption};
use weft_core::Event;

/// One entity transition.
#[repr(C, u8)]
#[derive(Debug)]
pub enum WeftEvent {
    /// A node transition.
    Node {
        /// Node id.
        id: WeftId,
        /// Payload before.
        prev: WeftOption<WeftNode>,
        /// Payload after.
        curr: WeftOption<WeftNode>,
    },
    /// An atom transition.
    Atom {
        /// Atom id.
        id: WeftId,
        /// Payload before.
        prev: WeftOption<WeftAtom>,
        /// Payload after.
        curr: WeftOption<WeftAtom>,
    },
    /// An edge transition.
    Edge {
        /// Edge id.
        id: WeftId,
        /// Payload before.
        prev: WeftOption<WeftEdge>,
        /// Payload after.
        curr: WeftOption<WeftEdge>,
    },
}

impl From<Event> for WeftEvent {
    fn from(event: Event) -> Self {
        match event {
            Event::Node { id, prev, curr } => Self::Node {
                id: id.into(),
                prev: prev.map(WeftNode::from).into(),
                curr: curr.map(WeftNode::from).into(),
            },
            Event::Atom { id, prev, curr } => Self::Atom {
                id: id.into(),
                prev: prev.map(WeftAtom::from).into(),
                curr: curr.map(WeftAtom::from).into(),
            },
            Event::Edge { id, prev, curr } => Self::Edge {
                id: id.into(),
                prev: prev.map(WeftEdge::from).into(),
                curr: curr.map(WeftEdge::from).into(),
            },
        }
    }
}

/// Drains every committed event since the last barrier, in commit order.
///
/// Release the array with `weft_release_events`.
///
/// # Safety
///
/// `handle` must be a live handle.
#[no_mangle]
pub unsafe extern "C" fn weft_barrier(handle: *mut WeftStore) -> WeftResult<WeftArray<WeftEvent>> {
    store_mut(handle)
        .and_then(|store| store.barrier().map_err(WeftError::from))
        .map(|events| WeftArray::from_vec(events.into_iter().map(WeftEvent::from).collect()))
        .into()
}

/// Releases an event array and the atom values in it.
///
/// # Safety
///
/// `array` must have been returned by `weft_barrier` and not released before.
#[no_mangle]
pub unsafe extern "C" fn weft_release_events(array: WeftArray<WeftEvent>) {
    for event in array.into_vec() {
        if let WeftEvent::Atom { prev, curr, .. } = event {
            for atom in [prev, curr] {
                if let WeftOption::Some(atom) = atom {
                    atom.release();
                }
            }
        }
    }
}
