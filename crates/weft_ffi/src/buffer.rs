//! Arrays handed across the boundary.

use crate::error::WeftError;
use crate::types::WeftId;

/// A Rust-owned array.
///
/// Release with the `weft_release_*` function matching the element type.
#[repr(C)]
#[derive(Debug)]
pub struct WeftArray<T> {
    /// Number of elements.
    pub len: usize,
    /// Pointer to the first element. Never null for arrays made here.
    pub ptr: *mut T,
}

impl<T> WeftArray<T> {
    /// Hands ownership of `vec` to the caller.
    pub fn from_vec(vec: Vec<T>) -> Self {
        let boxed = vec.into_boxed_slice();
        let len = boxed.len();
        let ptr = Box::into_raw(boxed).cast::<T>();
        Self { len, ptr }
    }

    /// Creates an empty array.
    pub fn empty() -> Self {
        Self::from_vec(Vec::new())
    }

    /// Takes ownership back.
    ///
    /// # Safety
    ///
    /// The array must come from [`WeftArray::from_vec`] and not have been
    /// released yet.
    pub unsafe fn into_vec(self) -> Vec<T> {
        if self.ptr.is_null() {
            return Vec::new();
        }
        Box::from_raw(std::ptr::slice_from_raw_parts_mut(self.ptr, self.len)).into_vec()
    }

    /// Borrows the elements.
    ///
    /// # Safety
    ///
    /// The array must be live.
    pub unsafe fn as_slice(&self) -> &[T] {
        if self.ptr.is_null() || self.len == 0 {
            return &[];
        }
        std::slice::from_raw_parts(self.ptr, self.len)
    }
}

/// Borrows caller-owned bytes.
///
/// A null pointer is accepted for an empty input.
pub(crate) unsafe fn input<'a>(ptr: *const u8, len: usize) -> Result<&'a [u8], WeftError> {
    if ptr.is_null() {
        if len == 0 {
            return Ok(&[]);
        }
        return Err(WeftError::invalid_argument("null buffer with non-zero length"));
    }
    Ok(std::slice::from_raw_parts(ptr, len))
}

/// Releases a byte array.
///
/// # Safety
///
/// `array` must have been returned by this library and not released before.
#[no_mangle]
pub unsafe extern "C" fn weft_release_bytes(array: WeftArray<u8>) {
    drop(array.into_vec());
}

/// Releases an id array.
///
/// # Safety
///
/// `array` must have been returned by this library and not released before.
#[no_mangle]
pub unsafe extern "C" fn weft_release_ids(array: WeftArray<WeftId>) {
    drop(array.into_vec());
}
