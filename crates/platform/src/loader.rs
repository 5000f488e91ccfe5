//! Already-loaded module lookup and export resolution
//!
//! Nothing here loads a library. A backend is only considered present when
//! the host process has loaded its runtime on its own.

use std::ffi::{c_void, CString};
use std::ptr::NonNull;

use crate::error::PlatformError;

/// Handle to a module that is already mapped into the process
pub struct LoadedModule {
    handle: NonNull<c_void>,
    name: String,
}

// SAFETY: The handle is an opaque token owned by the OS loader; it is never
// dereferenced, only passed back to the loader.
unsafe impl Send for LoadedModule {}
unsafe impl Sync for LoadedModule {}

impl LoadedModule {
    /// Find a module by file name without loading it
    ///
    /// Returns `Ok(None)` when the module is not loaded.
    pub fn find(name: &str) -> Result<Option<Self>, PlatformError> {
        let handle = sys::find_module(name)?;
        Ok(handle.map(|handle| Self {
            handle,
            name: name.to_string(),
        }))
    }

    /// Find a module, failing with [`PlatformError::ModuleNotLoaded`] if absent
    pub fn require(name: &str) -> Result<Self, PlatformError> {
        Self::find(name)?.ok_or_else(|| PlatformError::ModuleNotLoaded(name.to_string()))
    }

    /// Module file name this handle was looked up by
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolve an exported symbol
    ///
    /// Returns `Ok(None)` when the module does not export `symbol`.
    pub fn symbol(&self, symbol: &str) -> Result<Option<NonNull<c_void>>, PlatformError> {
        let symbol_c =
            CString::new(symbol).map_err(|_| PlatformError::InvalidName(symbol.to_string()))?;
        let address = unsafe { sys::resolve(self.handle, &symbol_c) };

        if address.is_none() {
            tracing::trace!("{} does not export {}", self.name, symbol);
        }

        Ok(address)
    }
}

impl Drop for LoadedModule {
    fn drop(&mut self) {
        unsafe { sys::release(self.handle) };
    }
}

impl std::fmt::Debug for LoadedModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedModule")
            .field("name", &self.name)
            .field("handle", &self.handle)
            .finish()
    }
}

#[cfg(unix)]
mod sys {
    use std::ffi::{c_void, CStr, CString};
    use std::ptr::NonNull;

    use crate::error::PlatformError;

    pub fn find_module(name: &str) -> Result<Option<NonNull<c_void>>, PlatformError> {
        let name_c = CString::new(name).map_err(|_| PlatformError::InvalidName(name.to_string()))?;

        // RTLD_NOLOAD only succeeds for libraries that are already mapped. It
        // still takes a reference, which `release` gives back.
        let handle = unsafe { libc::dlopen(name_c.as_ptr(), libc::RTLD_NOLOAD | libc::RTLD_LAZY) };

        Ok(NonNull::new(handle))
    }

    pub unsafe fn resolve(handle: NonNull<c_void>, symbol: &CStr) -> Option<NonNull<c_void>> {
        NonNull::new(libc::dlsym(handle.as_ptr(), symbol.as_ptr()))
    }

    pub unsafe fn release(handle: NonNull<c_void>) {
        libc::dlclose(handle.as_ptr());
    }
}

#[cfg(windows)]
mod sys {
    use std::ffi::{c_void, CStr};
    use std::ptr::NonNull;

    use windows::core::{HSTRING, PCSTR};
    use windows::Win32::Foundation::HMODULE;
    use windows::Win32::System::LibraryLoader::{GetModuleHandleW, GetProcAddress};

    use crate::error::PlatformError;

    pub fn find_module(name: &str) -> Result<Option<NonNull<c_void>>, PlatformError> {
        if name.contains('\0') {
            return Err(PlatformError::InvalidName(name.to_string()));
        }

        // GetModuleHandle does not take a reference, so there is nothing to
        // release later.
        let handle = unsafe { GetModuleHandleW(&HSTRING::from(name)) };

        Ok(handle.ok().and_then(|module| NonNull::new(module.0)))
    }

    pub unsafe fn resolve(handle: NonNull<c_void>, symbol: &CStr) -> Option<NonNull<c_void>> {
        let proc = GetProcAddress(
            HMODULE(handle.as_ptr()),
            PCSTR::from_raw(symbol.as_ptr() as *const u8),
        );
        proc.and_then(|f| NonNull::new(f as *mut c_void))
    }

    pub unsafe fn release(_handle: NonNull<c_void>) {}
}

#[cfg(not(any(unix, windows)))]
mod sys {
    use std::ffi::{c_void, CStr};
    use std::ptr::NonNull;

    use crate::error::PlatformError;

    pub fn find_module(_name: &str) -> Result<Option<NonNull<c_void>>, PlatformError> {
        Err(PlatformError::Unsupported("module lookup"))
    }

    pub unsafe fn resolve(_handle: NonNull<c_void>, _symbol: &CStr) -> Option<NonNull<c_void>> {
        None
    }

    pub unsafe fn release(_handle: NonNull<c_void>) {}
}
