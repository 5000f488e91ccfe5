//! Direct3D 11 strategy
//!
//! Creates a hardware device, immediate context and swap chain in one call,
//! then harvests swap chain, device and context tables.

use std::ffi::c_void;

use renderhook_platform::{Platform, WindowHandle};
use renderhook_sdk::modules::{self, entry_points, sdk_versions};
use windows::core::HRESULT;
use windows::Win32::Graphics::Direct3D::{
    D3D_DRIVER_TYPE, D3D_DRIVER_TYPE_HARDWARE, D3D_FEATURE_LEVEL, D3D_FEATURE_LEVEL_10_1,
    D3D_FEATURE_LEVEL_11_0,
};
use windows::Win32::Graphics::Direct3D11::{ID3D11Device, ID3D11DeviceContext};
use windows::Win32::Graphics::Dxgi::{
    IDXGISwapChain, DXGI_SWAP_CHAIN_DESC, DXGI_SWAP_EFFECT_DISCARD,
};

use super::dxgi::{self, check, entry_point, take_interface};
use super::factory::ContextStrategy;
use crate::backend::Backend;
use crate::error::SessionError;
use crate::table::TableBuilder;

type D3D11CreateDeviceAndSwapChainFn = unsafe extern "system" fn(
    adapter: *mut c_void,
    driver_type: D3D_DRIVER_TYPE,
    software: *mut c_void,
    flags: u32,
    feature_levels: *const D3D_FEATURE_LEVEL,
    feature_level_count: u32,
    sdk_version: u32,
    swap_chain_desc: *const DXGI_SWAP_CHAIN_DESC,
    swap_chain: *mut *mut c_void,
    device: *mut *mut c_void,
    feature_level: *mut D3D_FEATURE_LEVEL,
    immediate_context: *mut *mut c_void,
) -> HRESULT;

const FEATURE_LEVELS: [D3D_FEATURE_LEVEL; 2] = [D3D_FEATURE_LEVEL_10_1, D3D_FEATURE_LEVEL_11_0];

/// Throwaway Direct3D 11 objects, released in declaration order
pub struct D3D11Context {
    swap_chain: IDXGISwapChain,
    context: ID3D11DeviceContext,
    device: ID3D11Device,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct D3D11Strategy;

impl ContextStrategy for D3D11Strategy {
    type Context = D3D11Context;

    fn backend(&self) -> Backend {
        Backend::D3D11
    }

    fn create_context(
        &self,
        platform: &dyn Platform,
        window: WindowHandle,
    ) -> Result<Self::Context, SessionError> {
        unsafe {
            let create: D3D11CreateDeviceAndSwapChainFn = entry_point(
                platform,
                modules::D3D11,
                entry_points::D3D11_CREATE_DEVICE_AND_SWAP_CHAIN,
            )?;

            let desc = dxgi::swap_chain_desc(window, 1, DXGI_SWAP_EFFECT_DISCARD);
            let mut swap_chain = std::ptr::null_mut();
            let mut device = std::ptr::null_mut();
            let mut context = std::ptr::null_mut();
            let mut feature_level = D3D_FEATURE_LEVEL::default();

            check(
                create(
                    std::ptr::null_mut(),
                    D3D_DRIVER_TYPE_HARDWARE,
                    std::ptr::null_mut(),
                    0,
                    FEATURE_LEVELS.as_ptr(),
                    FEATURE_LEVELS.len() as u32,
                    sdk_versions::D3D11,
                    &desc,
                    &mut swap_chain,
                    &mut device,
                    &mut feature_level,
                    &mut context,
                ),
                "ID3D11Device",
            )?;

            tracing::debug!("D3D11 device created at feature level {:x}", feature_level.0);

            let swap_chain = take_interface::<IDXGISwapChain>(swap_chain, "IDXGISwapChain");
            let device = take_interface::<ID3D11Device>(device, "ID3D11Device");
            let context = take_interface::<ID3D11DeviceContext>(context, "ID3D11DeviceContext");

            Ok(D3D11Context {
                swap_chain: swap_chain?,
                context: context?,
                device: device?,
            })
        }
    }

    fn harvest_slots(
        &self,
        context: &Self::Context,
        table: &mut TableBuilder,
    ) -> Result<(), SessionError> {
        dxgi::harvest(table, "IDXGISwapChain", &context.swap_chain)?;
        dxgi::harvest(table, "ID3D11Device", &context.device)?;
        dxgi::harvest(table, "ID3D11DeviceContext", &context.context)
    }
}
