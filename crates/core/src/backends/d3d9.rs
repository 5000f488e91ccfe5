//! Direct3D 9 strategy
//!
//! Creates an `IDirect3D9` and a NULLREF device with software vertex
//! processing, then harvests the `IDirect3DDevice9` table.

use std::ffi::c_void;

use renderhook_platform::{Platform, WindowHandle};
use renderhook_sdk::modules::{self, entry_points, sdk_versions};
use windows::Win32::Foundation::BOOL;
use windows::Win32::Graphics::Direct3D9::{
    IDirect3D9, IDirect3DDevice9, D3DADAPTER_DEFAULT, D3DCREATE_DISABLE_DRIVER_MANAGEMENT,
    D3DCREATE_SOFTWARE_VERTEXPROCESSING, D3DDEVTYPE_NULLREF, D3DFMT_UNKNOWN,
    D3DMULTISAMPLE_NONE, D3DPRESENT_PARAMETERS, D3DSWAPEFFECT_DISCARD,
};

use super::dxgi::{self, creation_error, entry_point, take_interface};
use super::factory::ContextStrategy;
use crate::backend::Backend;
use crate::error::SessionError;
use crate::table::TableBuilder;

type Direct3DCreate9Fn = unsafe extern "system" fn(sdk_version: u32) -> *mut c_void;

/// Throwaway Direct3D 9 objects; the device is released first
pub struct D3D9Context {
    device: IDirect3DDevice9,
    _direct3d: IDirect3D9,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct D3D9Strategy;

impl ContextStrategy for D3D9Strategy {
    type Context = D3D9Context;

    fn backend(&self) -> Backend {
        Backend::D3D9
    }

    fn create_context(
        &self,
        platform: &dyn Platform,
        window: WindowHandle,
    ) -> Result<Self::Context, SessionError> {
        unsafe {
            let create: Direct3DCreate9Fn =
                entry_point(platform, modules::D3D9, entry_points::DIRECT3D_CREATE9)?;
            let direct3d: IDirect3D9 = take_interface(create(sdk_versions::D3D9), "IDirect3D9")?;

            let mut params = D3DPRESENT_PARAMETERS {
                BackBufferWidth: 0,
                BackBufferHeight: 0,
                BackBufferFormat: D3DFMT_UNKNOWN,
                BackBufferCount: 0,
                MultiSampleType: D3DMULTISAMPLE_NONE,
                MultiSampleQuality: 0,
                SwapEffect: D3DSWAPEFFECT_DISCARD,
                hDeviceWindow: dxgi::hwnd(window),
                Windowed: BOOL::from(true),
                EnableAutoDepthStencil: BOOL::from(false),
                AutoDepthStencilFormat: D3DFMT_UNKNOWN,
                Flags: 0,
                FullScreen_RefreshRateInHz: 0,
                PresentationInterval: 0,
            };

            let mut device = None;
            direct3d
                .CreateDevice(
                    D3DADAPTER_DEFAULT,
                    D3DDEVTYPE_NULLREF,
                    dxgi::hwnd(window),
                    (D3DCREATE_SOFTWARE_VERTEXPROCESSING | D3DCREATE_DISABLE_DRIVER_MANAGEMENT)
                        as u32,
                    &mut params,
                    &mut device,
                )
                .map_err(|e| creation_error("IDirect3DDevice9", e))?;

            let device = device.ok_or(SessionError::ContextCreation {
                object: "IDirect3DDevice9",
                reason: "no device returned".to_string(),
            })?;

            Ok(D3D9Context {
                device,
                _direct3d: direct3d,
            })
        }
    }

    fn harvest_slots(
        &self,
        context: &Self::Context,
        table: &mut TableBuilder,
    ) -> Result<(), SessionError> {
        dxgi::harvest(table, "IDirect3DDevice9", &context.device)
    }
}
