//! Index enumerations.
//!
//! Every query returns an owned array in index order. Id arrays are released
//! with `weft_release_ids`, edge arrays with `weft_release_edges` and atom
//! arrays with `weft_release_atoms`.

use crate::buffer::{input, WeftArray};
use crate::error::{WeftError, WeftResult};
use crate::store::{store_ref, WeftStore};
use crate::types::{WeftAtom, WeftAtomEntry, WeftEdge, WeftEdgeEntry, WeftId};
use weft_core::{CoreResult, Id, Label, Store};

unsafe fn query<T, F>(handle: *const WeftStore, f: F) -> WeftResult<WeftArray<T>>
where
    F: FnOnce(&Store) -> CoreResult<Vec<T>>,
{
    store_ref(handle)
        .and_then(|store| f(store).map_err(WeftError::from))
        .map(WeftArray::from_vec)
        .into()
}

fn edge(id: Id, src: Id, label: Label, dst: Id) -> WeftEdgeEntry {
    WeftEdgeEntry {
        id: id.into(),
        edge: WeftEdge {
            src: src.into(),
            label: label.as_u64(),
            dst: dst.into(),
        },
    }
}

fn atom(id: Id, src: Id, label: Label, value: Vec<u8>) -> WeftAtomEntry {
    WeftAtomEntry {
        id: id.into(),
        atom: WeftAtom::new(src, label, value),
    }
}

/// Ids of nodes labelled `label`.
///
/// # Safety
///
/// `handle` must be a live handle.
#[no_mangle]
pub unsafe extern "C" fn weft_nodes_by_label(
    handle: *const WeftStore,
    label: u64,
) -> WeftResult<WeftArray<WeftId>> {
    query(handle, |store| {
        Ok(store
            .nodes_by_label(Label(label))?
            .into_iter()
            .map(WeftId::from)
            .collect())
    })
}

/// Outgoing edges of `src`.
///
/// # Safety
///
/// `handle` must be a live handle.
#[no_mangle]
pub unsafe extern "C" fn weft_edges_by_src(
    handle: *const WeftStore,
    src: WeftId,
) -> WeftResult<WeftArray<WeftEdgeEntry>> {
    let src = Id::from(src);
    query(handle, |store| {
        Ok(store
            .edges_by_src(src)?
            .into_iter()
            .map(|(id, label, dst)| edge(id, src, label, dst))
            .collect())
    })
}

/// Outgoing `label` edges of `src`.
///
/// # Safety
///
/// `handle` must be a live handle.
#[no_mangle]
pub unsafe extern "C" fn weft_edges_by_src_label(
    handle: *const WeftStore,
    src: WeftId,
    label: u64,
) -> WeftResult<WeftArray<WeftEdgeEntry>> {
    let (src, label) = (Id::from(src), Label(label));
    query(handle, |store| {
        Ok(store
            .edges_by_src_label(src, label)?
            .into_iter()
            .map(|(id, dst)| edge(id, src, label, dst))
            .collect())
    })
}

/// Incoming edges of `dst`.
///
/// # Safety
///
/// `handle` must be a live handle.
#[no_mangle]
pub unsafe extern "C" fn weft_edges_by_dst(
    handle: *const WeftStore,
    dst: WeftId,
) -> WeftResult<WeftArray<WeftEdgeEntry>> {
    let dst = Id::from(dst);
    query(handle, |store| {
        Ok(store
            .edges_by_dst(dst)?
            .into_iter()
            .map(|(id, src, label)| edge(id, src, label, dst))
            .collect())
    })
}

/// Incoming `label` edges of `dst`.
///
/// # Safety
///
/// `handle` must be a live handle.
#[no_mangle]
pub unsafe extern "C" fn weft_edges_by_dst_label(
    handle: *const WeftStore,
    dst: WeftId,
    label: u64,
) -> WeftResult<WeftArray<WeftEdgeEntry>> {
    let (dst, label) = (Id::from(dst), Label(label));
    query(handle, |store| {
        Ok(store
            .edges_by_dst_label(dst, label)?
            .into_iter()
            .map(|(id, src)| edge(id, src, label, dst))
            .collect())
    })
}

/// Atoms attached to `src`.
///
/// # Safety
///
/// `handle` must be a live handle.
#[no_mangle]
pub unsafe extern "C" fn weft_atoms_by_src(
    handle: *const WeftStore,
    src: WeftId,
) -> WeftResult<WeftArray<WeftAtomEntry>> {
    let src = Id::from(src);
    query(handle, |store| {
        Ok(store
            .atoms_by_src(src)?
            .into_iter()
            .map(|(id, label, value)| atom(id, src, label, value))
            .collect())
    })
}

/// `label` atoms attached to `src`.
///
/// # Safety
///
/// `handle` must be a live handle.
#[no_mangle]
pub unsafe extern "C" fn weft_atoms_by_src_label(
    handle: *const WeftStore,
    src: WeftId,
    label: u64,
) -> WeftResult<WeftArray<WeftAtomEntry>> {
    let (src, label) = (Id::from(src), Label(label));
    query(handle, |store| {
        Ok(store
            .atoms_by_src_label(src, label)?
            .into_iter()
            .map(|(id, value)| atom(id, src, label, value))
            .collect())
    })
}

/// Atoms labelled `label`, in value order.
///
/// # Safety
///
/// `handle` must be a live handle.
#[no_mangle]
pub unsafe extern "C" fn weft_atoms_by_label(
    handle: *const WeftStore,
    label: u64,
) -> WeftResult<WeftArray<WeftAtomEntry>> {
    let label = Label(label);
    query(handle, |store| {
        Ok(store
            .atoms_by_label(label)?
            .into_iter()
            .map(|(id, src, value)| atom(id, src, label, value))
            .collect())
    })
}

/// Atoms labelled `label` whose value starts with `prefix`, in value order.
///
/// # Safety
///
/// `handle` must be a live handle and `prefix` must point to `len` readable
/// bytes, or be null with `len` zero.
#[no_mangle]
pub unsafe extern "C" fn weft_atoms_by_label_value(
    handle: *const WeftStore,
    label: u64,
    prefix: *const u8,
    len: usize,
) -> WeftResult<WeftArray<WeftAtomEntry>> {
    let prefix = match input(prefix, len) {
        Ok(prefix) => prefix,
        Err(error) => return WeftResult::Err(error),
    };
    let label = Label(label);
    query(handle, |store| {
        let mut entries = Vec::new();
        for (id, src) in store.atoms_by_label_value(label, prefix)? {
            if let Some(found) = store.atom(id)? {
                entries.push(atom(id, src, label, found.value));
            }
        }
        Ok(entries)
    })
}

/// Releases an edge array.
///
/// # Safety
///
/// `array` must have been returned by this library and not released before.
#[no_mangle]
pub unsafe extern "C" fn weft_release_edges(array: WeftArray<WeftEdgeEntry>) {
    drop(array.into_vec());
}

/// Releases an atom array and every value in it.
///
/// # Safety
///
/// `array` must have been returned by this library and not released before.
#[no_mangle]
pub unsafe extern "C" fn weft_release_atoms(array: WeftArray<WeftAtomEntry>) {
    for entry in array.into_vec() {
        entry.atom.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::weft_release_ids;
    use crate::store::tests::{close, open};
    use crate::store::{weft_mint, weft_set_atom, weft_set_edge, weft_set_node};

    #[test]
    fn node_and_edge_indexes() {
        let handle = open();
        let (a, b, e) = (weft_mint(), weft_mint(), weft_mint());
        unsafe {
            weft_set_node(handle, a, 1).into_result().unwrap();
            weft_set_node(handle, b, 1).into_result().unwrap();
            weft_set_edge(handle, e, a, 2, b).into_result().unwrap();

            let ids = weft_nodes_by_label(handle, 1).into_result().unwrap();
            assert_eq!(ids.len, 2);
            weft_release_ids(ids);

            let out = weft_edges_by_src_label(handle, a, 2).into_result().unwrap();
            assert_eq!(out.as_slice()[0].id, e);
            assert_eq!(out.as_slice()[0].edge.dst, b);
            weft_release_edges(out);

            let inbound = weft_edges_by_dst(handle, b).into_result().unwrap();
            assert_eq!(inbound.as_slice()[0].edge.src, a);
            assert_eq!(inbound.as_slice()[0].edge.label, 2);
            weft_release_edges(inbound);

            let none = weft_edges_by_src(handle, b).into_result().unwrap();
            assert_eq!(none.len, 0);
            weft_release_edges(none);
        }
        close(handle);
    }

    #[test]
    fn atom_prefix_lookup() {
        let handle = open();
        let owner = weft_mint();
        unsafe {
            for name in [b"alice".as_slice(), b"alfred".as_slice(), b"bob".as_slice()] {
                weft_set_atom(handle, weft_mint(), owner, 9, name.as_ptr(), name.len())
                    .into_result()
                    .unwrap();
            }
            let prefix = b"al";
            let found = weft_atoms_by_label_value(handle, 9, prefix.as_ptr(), prefix.len())
                .into_result()
                .unwrap();
            let values: Vec<&[u8]> = found
                .as_slice()
                .iter()
                .map(|entry| entry.atom.value.as_slice())
                .collect();
            assert_eq!(values, [b"alfred".as_slice(), b"alice".as_slice()]);
            weft_release_atoms(found);

            let all = weft_atoms_by_src_label(handle, owner, 9).into_result().unwrap();
            assert_eq!(all.len, 3);
            weft_release_atoms(all);
        }
        close(handle);
    }
}
