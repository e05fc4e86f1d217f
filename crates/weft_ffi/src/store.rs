//! Store lifecycle, declarations and entity access.

use crate::buffer::{input, WeftArray};
use crate::error::{WeftError, WeftResult};
use crate::types::{WeftAtom, WeftEdge, WeftId, WeftKind, WeftNode, WeftOption, WeftUnit};
use std::ffi::{c_char, CStr};
use weft_core::{Id, Label, Store};

/// An opaque store handle.
///
/// Never dereference or modify directly.
#[repr(C)]
pub struct WeftStore {
    _private: [u8; 0],
}

fn into_handle(store: Store) -> *mut WeftStore {
    Box::into_raw(Box::new(store)).cast::<WeftStore>()
}

pub(crate) unsafe fn store_ref<'a>(handle: *const WeftStore) -> Result<&'a Store, WeftError> {
    handle
        .cast::<Store>()
        .as_ref()
        .ok_or_else(WeftError::null_handle)
}

pub(crate) unsafe fn store_mut<'a>(handle: *mut WeftStore) -> Result<&'a mut Store, WeftError> {
    handle
        .cast::<Store>()
        .as_mut()
        .ok_or_else(WeftError::null_handle)
}

/// Opens the store in directory `path`, or an in-memory store if `path` is
/// null.
///
/// # Safety
///
/// `path` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn weft_open(path: *const c_char) -> WeftResult<*mut WeftStore> {
    let store = if path.is_null() {
        Store::open_in_memory()
    } else {
        let Ok(path) = CStr::from_ptr(path).to_str() else {
            return WeftResult::Err(WeftError::invalid_argument("invalid UTF-8 in path"));
        };
        Store::open(path)
    };
    store.map(into_handle).into()
}

/// Opens an in-memory store from snapshot bytes.
///
/// # Safety
///
/// `bytes` must point to `len` readable bytes, or be null with `len` zero.
#[no_mangle]
pub unsafe extern "C" fn weft_open_snapshot(
    bytes: *const u8,
    len: usize,
) -> WeftResult<*mut WeftStore> {
    input(bytes, len)
        .and_then(|bytes| Store::from_snapshot(bytes).map_err(WeftError::from))
        .map(into_handle)
        .into()
}

/// Serializes the store's current state.
///
/// # Safety
///
/// `handle` must be a live handle.
#[no_mangle]
pub unsafe extern "C" fn weft_snapshot(handle: *const WeftStore) -> WeftResult<WeftArray<u8>> {
    store_ref(handle)
        .and_then(|store| store.snapshot().map_err(WeftError::from))
        .map(WeftArray::from_vec)
        .into()
}

/// Commits pending writes and returns the commit sequence.
///
/// # Safety
///
/// `handle` must be a live handle.
#[no_mangle]
pub unsafe extern "C" fn weft_commit(handle: *mut WeftStore) -> WeftResult<u64> {
    store_mut(handle)
        .and_then(|store| store.commit().map_err(WeftError::from))
        .map(|sequence| sequence.as_u64())
        .into()
}

/// Closes the store and frees the handle.
///
/// The handle is freed even if closing fails.
///
/// # Safety
///
/// `handle` must be a live handle; it is invalid after this call.
#[no_mangle]
pub unsafe extern "C" fn weft_close(handle: *mut WeftStore) -> WeftResult<WeftUnit> {
    if handle.is_null() {
        return WeftResult::Err(WeftError::null_handle());
    }
    let mut store = Box::from_raw(handle.cast::<Store>());
    store.close().map(|()| WeftUnit::default()).into()
}

/// Mints a fresh random id.
#[no_mangle]
pub extern "C" fn weft_mint() -> WeftId {
    Id::mint().into()
}

/// Declares `label` sticky for entities of `kind`.
///
/// Returns false if it already was.
///
/// # Safety
///
/// `handle` must be a live handle.
#[no_mangle]
pub unsafe extern "C" fn weft_declare_sticky(
    handle: *mut WeftStore,
    kind: WeftKind,
    label: u64,
) -> WeftResult<bool> {
    store_mut(handle)
        .and_then(|store| {
            store
                .declare_sticky(kind.into(), Label(label))
                .map_err(WeftError::from)
        })
        .into()
}

/// Declares edge `label` acyclic.
///
/// Returns false if it already was.
///
/// # Safety
///
/// `handle` must be a live handle.
#[no_mangle]
pub unsafe extern "C" fn weft_declare_acyclic(
    handle: *mut WeftStore,
    label: u64,
) -> WeftResult<bool> {
    store_mut(handle)
        .and_then(|store| store.declare_acyclic(Label(label)).map_err(WeftError::from))
        .into()
}

/// Reads a node.
///
/// # Safety
///
/// `handle` must be a live handle.
#[no_mangle]
pub unsafe extern "C" fn weft_get_node(
    handle: *const WeftStore,
    id: WeftId,
) -> WeftResult<WeftOption<WeftNode>> {
    store_ref(handle)
        .and_then(|store| store.node(id.into()).map_err(WeftError::from))
        .map(|node| WeftOption::from(node.map(WeftNode::from)))
        .into()
}

/// Reads an edge.
///
/// # Safety
///
/// `handle` must be a live handle.
#[no_mangle]
pub unsafe extern "C" fn weft_get_edge(
    handle: *const WeftStore,
    id: WeftId,
) -> WeftResult<WeftOption<WeftEdge>> {
    store_ref(handle)
        .and_then(|store| store.edge(id.into()).map_err(WeftError::from))
        .map(|edge| WeftOption::from(edge.map(WeftEdge::from)))
        .into()
}

/// Reads an atom. A present atom must be released with `weft_release_atom`.
///
/// # Safety
///
/// `handle` must be a live handle.
#[no_mangle]
pub unsafe extern "C" fn weft_get_atom(
    handle: *const WeftStore,
    id: WeftId,
) -> WeftResult<WeftOption<WeftAtom>> {
    store_ref(handle)
        .and_then(|store| store.atom(id.into()).map_err(WeftError::from))
        .map(|atom| WeftOption::from(atom.map(WeftAtom::from)))
        .into()
}

/// Releases an atom returned by `weft_get_atom`.
///
/// # Safety
///
/// `atom` must have been returned by this library and not released before.
#[no_mangle]
pub unsafe extern "C" fn weft_release_atom(atom: WeftOption<WeftAtom>) {
    if let WeftOption::Some(atom) = atom {
        atom.release();
    }
}

/// Sets a node.
///
/// # Safety
///
/// `handle` must be a live handle.
#[no_mangle]
pub unsafe extern "C" fn weft_set_node(
    handle: *mut WeftStore,
    id: WeftId,
    label: u64,
) -> WeftResult<WeftUnit> {
    write(handle, |store| store.set_node(id.into(), Label(label)))
}

/// Removes a node.
///
/// # Safety
///
/// `handle` must be a live handle.
#[no_mangle]
pub unsafe extern "C" fn weft_remove_node(handle: *mut WeftStore, id: WeftId) -> WeftResult<WeftUnit> {
    write(handle, |store| store.remove_node(id.into()))
}

/// Sets an edge.
///
/// # Safety
///
/// `handle` must be a live handle.
#[no_mangle]
pub unsafe extern "C" fn weft_set_edge(
    handle: *mut WeftStore,
    id: WeftId,
    src: WeftId,
    label: u64,
    dst: WeftId,
) -> WeftResult<WeftUnit> {
    write(handle, |store| {
        store.set_edge(id.into(), src.into(), Label(label), dst.into())
    })
}

/// Removes an edge.
///
/// # Safety
///
/// `handle` must be a live handle.
#[no_mangle]
pub unsafe extern "C" fn weft_remove_edge(handle: *mut WeftStore, id: WeftId) -> WeftResult<WeftUnit> {
    write(handle, |store| store.remove_edge(id.into()))
}

/// Sets an atom. The value is copied.
///
/// # Safety
///
/// `handle` must be a live handle and `value` must point to `len` readable
/// bytes, or be null with `len` zero.
#[no_mangle]
pub unsafe extern "C" fn weft_set_atom(
    handle: *mut WeftStore,
    id: WeftId,
    src: WeftId,
    label: u64,
    value: *const u8,
    len: usize,
) -> WeftResult<WeftUnit> {
    let value = match input(value, len) {
        Ok(value) => value.to_vec(),
        Err(error) => return WeftResult::Err(error),
    };
    write(handle, |store| {
        store.set_atom(id.into(), src.into(), Label(label), value)
    })
}

/// Removes an atom.
///
/// # Safety
///
/// `handle` must be a live handle.
#[no_mangle]
pub unsafe extern "C" fn weft_remove_atom(handle: *mut WeftStore, id: WeftId) -> WeftResult<WeftUnit> {
    write(handle, |store| store.remove_atom(id.into()))
}

unsafe fn write<F>(handle: *mut WeftStore, f: F) -> WeftResult<WeftUnit>
where
    F: FnOnce(&mut Store) -> weft_core::CoreResult<()>,
{
    store_mut(handle)
        .and_then(|store| f(store).map_err(WeftError::from))
        .map(|()| WeftUnit::default())
        .into()
}
