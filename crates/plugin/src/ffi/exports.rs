//! C-compatible exports

use std::ffi::{c_char, c_int, c_void};

use renderhook_core::{Backend, SessionError, Status};
use tracing::instrument;

use super::guarded;
use crate::{existing_session, session};

static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
static UNKNOWN_STATUS: &[u8] = b"Unknown status code\0";

fn status_code(result: Result<(), SessionError>) -> c_int {
    match result {
        Ok(()) => Status::Success.as_raw(),
        Err(e) => {
            tracing::debug!("Returning {:?}: {}", e.status(), e);
            e.status().as_raw()
        }
    }
}

/// Initialize `backend` (a `Backend` raw value) as the active backend
///
/// Returns a status code; unknown backend values yield `NotSupportedError`.
#[no_mangle]
#[instrument(level = "debug")]
pub extern "C" fn renderhook_init(backend: c_int) -> c_int {
    guarded("renderhook_init", Status::UnknownError.as_raw(), || {
        let Some(backend) = Backend::from_raw(backend) else {
            tracing::warn!("Unknown backend value {}", backend);
            return Status::NotSupportedError.as_raw();
        };
        status_code(session().init(backend))
    })
}

/// Disable every hook and release the active backend
#[no_mangle]
#[instrument(level = "debug")]
pub extern "C" fn renderhook_shutdown() {
    guarded("renderhook_shutdown", (), || {
        if let Some(mut session) = existing_session() {
            session.shutdown();
        }
    })
}

/// Redirect slot `index` to `function`, storing the original in `*original`
///
/// # Safety
/// - `original` must be null or valid for a pointer-sized write
/// - `function` must match the signature and calling convention of the slot
#[no_mangle]
#[instrument(level = "debug", skip(original, function))]
pub unsafe extern "C" fn renderhook_bind(
    index: u16,
    original: *mut *mut c_void,
    function: *mut c_void,
) -> c_int {
    guarded("renderhook_bind", Status::UnknownError.as_raw(), || {
        if original.is_null() || function.is_null() {
            return Status::InvalidArgumentError.as_raw();
        }

        let result = session()
            .bind(index as usize, function as *const ())
            .map(|trampoline| *original = trampoline as *mut c_void);
        status_code(result)
    })
}

/// Remove the hook on slot `index`, if any
#[no_mangle]
#[instrument(level = "debug")]
pub extern "C" fn renderhook_unbind(index: u16) {
    guarded("renderhook_unbind", (), || {
        if let Some(mut session) = existing_session() {
            session.unbind(index as usize);
        }
    })
}

/// Raw value of the active backend, 0 when uninitialized
#[no_mangle]
pub extern "C" fn renderhook_get_render_type() -> c_int {
    guarded("renderhook_get_render_type", Backend::None.as_raw(), || {
        existing_session()
            .map(|session| session.active_backend())
            .unwrap_or(Backend::None)
            .as_raw()
    })
}

/// Method table of the active backend, null when uninitialized
///
/// The pointer is valid until `renderhook_shutdown`.
#[no_mangle]
pub extern "C" fn renderhook_get_methods_table() -> *mut *mut c_void {
    guarded("renderhook_get_methods_table", std::ptr::null_mut(), || {
        existing_session()
            .and_then(|session| session.method_table().map(|table| table.as_ptr()))
            .map_or(std::ptr::null_mut(), |table| table as *mut *mut c_void)
    })
}

/// Number of slots in the method table, 0 when uninitialized
#[no_mangle]
pub extern "C" fn renderhook_get_methods_count() -> usize {
    guarded("renderhook_get_methods_count", 0, || {
        existing_session()
            .and_then(|session| session.method_table().map(|table| table.len()))
            .unwrap_or(0)
    })
}

/// Static description of a status code
#[no_mangle]
pub extern "C" fn renderhook_status_string(status: c_int) -> *const c_char {
    match Status::from_raw(status) {
        Some(status) => status.as_c_str().as_ptr(),
        None => UNKNOWN_STATUS.as_ptr() as *const c_char,
    }
}

/// Library version as a static C string
#[no_mangle]
pub extern "C" fn renderhook_get_version() -> *const c_char {
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;

    fn c_str(ptr: *const c_char) -> &'static str {
        unsafe { CStr::from_ptr(ptr) }.to_str().unwrap()
    }

    #[test]
    fn test_version_string() {
        assert_eq!(c_str(renderhook_get_version()), env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_status_strings() {
        assert_eq!(c_str(renderhook_status_string(0)), "Success");
        assert_eq!(
            c_str(renderhook_status_string(-6)),
            Status::InvalidArgumentError.to_error_string()
        );
        assert_eq!(c_str(renderhook_status_string(42)), "Unknown status code");
    }

    #[test]
    fn test_init_rejects_unknown_backend() {
        assert_eq!(renderhook_init(99), Status::NotSupportedError.as_raw());
        assert_eq!(renderhook_get_render_type(), Backend::None.as_raw());
    }

    #[test]
    fn test_init_none_is_noop() {
        assert_eq!(renderhook_init(Backend::None.as_raw()), Status::Success.as_raw());
        assert_eq!(renderhook_get_render_type(), Backend::None.as_raw());
        assert!(renderhook_get_methods_table().is_null());
        assert_eq!(renderhook_get_methods_count(), 0);
    }

    #[test]
    fn test_init_missing_module() {
        // The test binary never loads the Vulkan loader
        assert_eq!(
            renderhook_init(Backend::Vulkan.as_raw()),
            Status::ModuleNotFoundError.as_raw()
        );
        assert_eq!(renderhook_get_render_type(), Backend::None.as_raw());
    }

    #[test]
    fn test_bind_null_arguments() {
        let mut original = std::ptr::null_mut();
        let status = unsafe { renderhook_bind(0, std::ptr::null_mut(), 0x1000 as *mut c_void) };
        assert_eq!(status, Status::InvalidArgumentError.as_raw());

        let status = unsafe { renderhook_bind(0, &mut original, std::ptr::null_mut()) };
        assert_eq!(status, Status::InvalidArgumentError.as_raw());
        assert!(original.is_null());
    }

    #[test]
    fn test_bind_requires_init() {
        let mut original = std::ptr::null_mut();
        let status = unsafe { renderhook_bind(8, &mut original, 0x1000 as *mut c_void) };
        assert_eq!(status, Status::NotInitializedError.as_raw());
        assert!(original.is_null());
    }

    #[test]
    fn test_uninitialized_calls_are_noops() {
        renderhook_unbind(8);
        renderhook_shutdown();
        assert_eq!(renderhook_get_render_type(), Backend::None.as_raw());
    }
}
