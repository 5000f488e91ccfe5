//! Helpers shared by the Direct3D strategies

use std::ffi::c_void;
use std::ptr::NonNull;

use renderhook_platform::{Platform, WindowHandle};
use renderhook_sdk::modules::{self, dummy_window, entry_points};
use windows::core::{Interface, GUID, HRESULT};
use windows::Win32::Foundation::{BOOL, HWND};
use windows::Win32::Graphics::Dxgi::Common::{
    DXGI_FORMAT_R8G8B8A8_UNORM, DXGI_MODE_DESC, DXGI_MODE_SCALING_UNSPECIFIED,
    DXGI_MODE_SCANLINE_ORDER_UNSPECIFIED, DXGI_RATIONAL, DXGI_SAMPLE_DESC,
};
use windows::Win32::Graphics::Dxgi::{
    IDXGIFactory, DXGI_SWAP_CHAIN_DESC, DXGI_SWAP_CHAIN_FLAG_ALLOW_MODE_SWITCH, DXGI_SWAP_EFFECT,
    DXGI_USAGE_RENDER_TARGET_OUTPUT,
};

use crate::error::SessionError;
use crate::table::{read_dispatch_table, TableBuilder};

type CreateDxgiFactoryFn =
    unsafe extern "system" fn(riid: *const GUID, factory: *mut *mut c_void) -> HRESULT;

pub(crate) fn hwnd(window: WindowHandle) -> HWND {
    HWND(window.as_raw())
}

/// Resolve an entry point of an already-loaded module as a function pointer
///
/// # Safety
/// `F` must be the `extern "system"` function pointer type of the export
pub(crate) unsafe fn entry_point<F: Copy>(
    platform: &dyn Platform,
    module: &str,
    name: &'static str,
) -> Result<F, SessionError> {
    debug_assert_eq!(std::mem::size_of::<F>(), std::mem::size_of::<*mut c_void>());

    let address = platform
        .resolve_symbol(module, name)?
        .ok_or(SessionError::EntryPointNotFound(name))?;

    tracing::debug!("Resolved {}!{} at {:p}", module, name, address.as_ptr());
    Ok(std::mem::transmute_copy(&address.as_ptr()))
}

/// Map a failed HRESULT to a construction error for `object`
pub(crate) fn check(hr: HRESULT, object: &'static str) -> Result<(), SessionError> {
    hr.ok().map_err(|e| creation_error(object, e))
}

pub(crate) fn creation_error(object: &'static str, error: windows::core::Error) -> SessionError {
    tracing::debug!("Failed to create {}: {}", object, error);
    SessionError::ContextCreation {
        object,
        reason: error.to_string(),
    }
}

/// Take ownership of an interface pointer returned through an out parameter
///
/// # Safety
/// `raw` must be null or an owned reference to an `I`
pub(crate) unsafe fn take_interface<I: Interface>(
    raw: *mut c_void,
    object: &'static str,
) -> Result<I, SessionError> {
    if raw.is_null() {
        return Err(SessionError::ContextCreation {
            object,
            reason: "null interface returned".to_string(),
        });
    }
    Ok(I::from_raw(raw))
}

/// `IDXGIFactory` from the loaded dxgi module
pub(crate) fn create_factory(platform: &dyn Platform) -> Result<IDXGIFactory, SessionError> {
    unsafe {
        let create: CreateDxgiFactoryFn =
            entry_point(platform, modules::DXGI, entry_points::CREATE_DXGI_FACTORY)?;

        let mut factory = std::ptr::null_mut();
        check(create(&IDXGIFactory::IID, &mut factory), "IDXGIFactory")?;
        take_interface(factory, "IDXGIFactory")
    }
}

/// Windowed 100x100 RGBA8 swap chain presenting to `window`
pub(crate) fn swap_chain_desc(
    window: WindowHandle,
    buffers: u32,
    effect: DXGI_SWAP_EFFECT,
) -> DXGI_SWAP_CHAIN_DESC {
    DXGI_SWAP_CHAIN_DESC {
        BufferDesc: DXGI_MODE_DESC {
            Width: dummy_window::SIZE,
            Height: dummy_window::SIZE,
            RefreshRate: DXGI_RATIONAL {
                Numerator: 60,
                Denominator: 1,
            },
            Format: DXGI_FORMAT_R8G8B8A8_UNORM,
            ScanlineOrdering: DXGI_MODE_SCANLINE_ORDER_UNSPECIFIED,
            Scaling: DXGI_MODE_SCALING_UNSPECIFIED,
        },
        SampleDesc: DXGI_SAMPLE_DESC {
            Count: 1,
            Quality: 0,
        },
        BufferUsage: DXGI_USAGE_RENDER_TARGET_OUTPUT,
        BufferCount: buffers,
        OutputWindow: hwnd(window),
        Windowed: BOOL::from(true),
        SwapEffect: effect,
        Flags: DXGI_SWAP_CHAIN_FLAG_ALLOW_MODE_SWITCH.0 as u32,
    }
}

/// Read the dispatch table of `interface` into the next sub-table
pub(crate) fn harvest<I: Interface>(
    table: &mut TableBuilder,
    name: &'static str,
    interface: &I,
) -> Result<(), SessionError> {
    let count = table
        .next_sub_table()
        .map(|sub| sub.count)
        .ok_or_else(|| SessionError::SubTableMismatch {
            expected: "end of table".to_string(),
            found: name.to_string(),
        })?;

    let object = NonNull::new(interface.as_raw()).ok_or(SessionError::ContextCreation {
        object: name,
        reason: "null interface".to_string(),
    })?;

    // SAFETY: `interface` is a live COM object and `count` is the published
    // method count of its interface
    let slots = unsafe { read_dispatch_table(object, count) }.ok_or(
        SessionError::ContextCreation {
            object: name,
            reason: "null dispatch table".to_string(),
        },
    )?;

    table.push(name, &slots)
}
