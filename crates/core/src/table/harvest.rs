//! Dispatch table reads

use std::ffi::c_void;
use std::ptr::NonNull;

/// Copy `count` slots from the dispatch table of `object`
///
/// Returns `None` if the object's dispatch table pointer is null.
///
/// # Safety
/// - `object` must point to a live object whose first word is a pointer to
///   its dispatch table
/// - That table must contain at least `count` function-pointer-sized entries
pub unsafe fn read_dispatch_table(object: NonNull<c_void>, count: usize) -> Option<Vec<*const ()>> {
    let table = *(object.as_ptr() as *const *const *const ());
    if table.is_null() {
        return None;
    }

    tracing::debug!(
        "Reading {} slots from object={:x}, table={:x}",
        count,
        object.as_ptr() as usize,
        table as usize
    );

    Some(std::slice::from_raw_parts(table, count).to_vec())
}
