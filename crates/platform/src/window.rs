//! Invisible dummy window used as the presentation target of throwaway devices
//!
//! The window is never shown and never pumped. Its class is registered right
//! before creation and unregistered right after destruction.

use std::ffi::c_void;
use std::ptr::NonNull;

use crate::error::PlatformError;

/// Raw native window handle (an `HWND` on Windows)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowHandle(NonNull<c_void>);

impl WindowHandle {
    /// Wrap a raw window handle
    pub fn from_raw(raw: NonNull<c_void>) -> Self {
        Self(raw)
    }

    /// Raw handle value
    pub fn as_raw(&self) -> *mut c_void {
        self.0.as_ptr()
    }
}

#[cfg(windows)]
pub fn create_dummy_window() -> Result<WindowHandle, PlatformError> {
    use renderhook_sdk::modules::dummy_window;
    use windows::core::{HSTRING, PCWSTR};
    use windows::Win32::Foundation::{GetLastError, ERROR_CLASS_ALREADY_EXISTS, HINSTANCE};
    use windows::Win32::System::LibraryLoader::GetModuleHandleW;
    use windows::Win32::UI::WindowsAndMessaging::{
        CreateWindowExW, RegisterClassExW, UnregisterClassW, CS_HREDRAW, CS_VREDRAW,
        WINDOW_EX_STYLE, WNDCLASSEXW, WS_OVERLAPPEDWINDOW,
    };

    unsafe {
        let instance: HINSTANCE = GetModuleHandleW(None)
            .map_err(|e| PlatformError::WindowClass(e.to_string()))?
            .into();
        let class_name = HSTRING::from(dummy_window::CLASS_NAME);

        let class = WNDCLASSEXW {
            cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
            style: CS_HREDRAW | CS_VREDRAW,
            lpfnWndProc: Some(dummy_window_proc),
            hInstance: instance,
            lpszClassName: PCWSTR(class_name.as_ptr()),
            ..Default::default()
        };

        if RegisterClassExW(&class) == 0 {
            let error = GetLastError();
            if error != ERROR_CLASS_ALREADY_EXISTS {
                return Err(PlatformError::WindowClass(format!("{:?}", error)));
            }
        }

        let size = dummy_window::SIZE as i32;
        let window = CreateWindowExW(
            WINDOW_EX_STYLE::default(),
            &class_name,
            &HSTRING::from(dummy_window::TITLE),
            WS_OVERLAPPEDWINDOW,
            0,
            0,
            size,
            size,
            None,
            None,
            instance,
            None,
        );

        match window.ok().and_then(|hwnd| NonNull::new(hwnd.0)) {
            Some(hwnd) => {
                tracing::debug!("Created dummy window {:p}", hwnd.as_ptr());
                Ok(WindowHandle(hwnd))
            }
            None => {
                let _ = UnregisterClassW(&class_name, instance);
                Err(PlatformError::WindowCreation(format!("{:?}", GetLastError())))
            }
        }
    }
}

#[cfg(windows)]
pub fn destroy_dummy_window(window: WindowHandle) {
    use renderhook_sdk::modules::dummy_window;
    use windows::core::HSTRING;
    use windows::Win32::Foundation::{HINSTANCE, HWND};
    use windows::Win32::System::LibraryLoader::GetModuleHandleW;
    use windows::Win32::UI::WindowsAndMessaging::{DestroyWindow, UnregisterClassW};

    unsafe {
        if let Err(e) = DestroyWindow(HWND(window.as_raw())) {
            tracing::warn!("Failed to destroy dummy window: {}", e);
        }

        let instance: HINSTANCE = GetModuleHandleW(None).unwrap_or_default().into();
        if let Err(e) = UnregisterClassW(&HSTRING::from(dummy_window::CLASS_NAME), instance) {
            tracing::warn!("Failed to unregister dummy window class: {}", e);
        }
    }

    tracing::debug!("Destroyed dummy window {:p}", window.as_raw());
}

#[cfg(windows)]
unsafe extern "system" fn dummy_window_proc(
    hwnd: windows::Win32::Foundation::HWND,
    msg: u32,
    wparam: windows::Win32::Foundation::WPARAM,
    lparam: windows::Win32::Foundation::LPARAM,
) -> windows::Win32::Foundation::LRESULT {
    windows::Win32::UI::WindowsAndMessaging::DefWindowProcW(hwnd, msg, wparam, lparam)
}

#[cfg(not(windows))]
pub fn create_dummy_window() -> Result<WindowHandle, PlatformError> {
    Err(PlatformError::Unsupported(
        "dummy windows are only needed by Direct3D backends",
    ))
}

#[cfg(not(windows))]
pub fn destroy_dummy_window(_window: WindowHandle) {}
